//! ### UEF chunks
//!
//! A chunk is a 16 bit id, a 32 bit length, and the payload, all little endian.
//! Chunks we understand are decoded into variants of `Chunk`, anything else is kept
//! as `Opaque` so it can be written back untouched.  A known id whose payload has
//! the wrong size is also kept as `Opaque`.  In every case `to_bytes` reproduces
//! the bytes the chunk was decoded from.

use std::fmt;
use num_traits::FromPrimitive;
use num_derive::FromPrimitive;

pub const HEADER_LEN: usize = 6;

#[derive(FromPrimitive,Clone,Copy,PartialEq,Eq,Debug)]
pub enum ChunkId {
    Origin = 0x0000,
    Instructions = 0x0001,
    TargetMachine = 0x0005,
    ImplicitData = 0x0100,
    MultiplexedData = 0x0101,
    ExplicitData = 0x0102,
    DefinedData = 0x0104,
    CarrierTone = 0x0110,
    CarrierToneDummy = 0x0111,
    IntegerGap = 0x0112,
    BaseFrequency = 0x0113,
    SecurityCycles = 0x0114,
    PhaseChange = 0x0115,
    FloatGap = 0x0116,
    BaudRate = 0x0117,
    PositionMarker = 0x0120,
    TapeSetInfo = 0x0130,
    TapeSide = 0x0131
}

/// First and last ids of the disc chunk family
pub const DISC_IDS: (u16,u16) = (0x0200,0x02ff);

#[derive(Clone,PartialEq,Debug)]
pub enum Chunk {
    /// text identifying the program that made the file, NUL and padding included
    Origin(Vec<u8>),
    Instructions(Vec<u8>),
    TargetMachine(u8),
    /// tape bytes, usually one tape block
    ImplicitData(Vec<u8>),
    MultiplexedData(Vec<u8>),
    /// tape bits, preceded by the count of unused bits at the end (version 0.9 on)
    ExplicitData(Vec<u8>),
    /// bits per packet, parity as `N`, `E`, or `O`, stop bits, then the packets
    DefinedData { bits: u8, parity: u8, stop: u8, data: Vec<u8> },
    /// duration in cycles of the base frequency
    CarrierTone(u16),
    CarrierToneDummy { before: u16, after: u16 },
    /// gap in milliseconds
    IntegerGap(u16),
    BaseFrequency(f32),
    SecurityCycles(Vec<u8>),
    PhaseChange(u16),
    /// gap in seconds
    FloatGap(f32),
    BaudRate(u16),
    PositionMarker(Vec<u8>),
    TapeSetInfo(Vec<u8>),
    TapeSide(Vec<u8>),
    Disc { id: u16, payload: Vec<u8> },
    Opaque { id: u16, payload: Vec<u8> }
}

fn le16(dat: &[u8]) -> u16 {
    u16::from_le_bytes([dat[0],dat[1]])
}

fn lef32(dat: &[u8]) -> f32 {
    f32::from_le_bytes([dat[0],dat[1],dat[2],dat[3]])
}

impl Chunk {
    /// Build a chunk from its id and payload, `payload.len()` is the length.
    pub fn from_raw(id: u16,payload: Vec<u8>) -> Self {
        let len = payload.len();
        let opaque = |payload: Vec<u8>| Self::Opaque { id, payload };
        if id >= DISC_IDS.0 && id <= DISC_IDS.1 {
            return Self::Disc { id, payload };
        }
        match (ChunkId::from_u16(id),len) {
            (Some(ChunkId::Origin),_) => Self::Origin(payload),
            (Some(ChunkId::Instructions),_) => Self::Instructions(payload),
            (Some(ChunkId::TargetMachine),1) => Self::TargetMachine(payload[0]),
            (Some(ChunkId::ImplicitData),_) => Self::ImplicitData(payload),
            (Some(ChunkId::MultiplexedData),_) => Self::MultiplexedData(payload),
            (Some(ChunkId::ExplicitData),_) => Self::ExplicitData(payload),
            (Some(ChunkId::DefinedData),l) if l >= 3 => Self::DefinedData {
                bits: payload[0],
                parity: payload[1],
                stop: payload[2],
                data: payload[3..].to_vec()
            },
            (Some(ChunkId::CarrierTone),2) => Self::CarrierTone(le16(&payload)),
            (Some(ChunkId::CarrierToneDummy),4) => Self::CarrierToneDummy {
                before: le16(&payload[0..2]),
                after: le16(&payload[2..4])
            },
            (Some(ChunkId::IntegerGap),2) => Self::IntegerGap(le16(&payload)),
            (Some(ChunkId::BaseFrequency),4) => Self::BaseFrequency(lef32(&payload)),
            (Some(ChunkId::SecurityCycles),_) => Self::SecurityCycles(payload),
            (Some(ChunkId::PhaseChange),2) => Self::PhaseChange(le16(&payload)),
            (Some(ChunkId::FloatGap),4) => Self::FloatGap(lef32(&payload)),
            (Some(ChunkId::BaudRate),2) => Self::BaudRate(le16(&payload)),
            (Some(ChunkId::PositionMarker),_) => Self::PositionMarker(payload),
            (Some(ChunkId::TapeSetInfo),_) => Self::TapeSetInfo(payload),
            (Some(ChunkId::TapeSide),_) => Self::TapeSide(payload),
            (Some(known),l) => {
                log::warn!("chunk {:?} has unexpected length {}, keeping it opaque",known,l);
                opaque(payload)
            },
            (None,_) => opaque(payload)
        }
    }
    /// Origin chunk holding `text`, NUL terminated and padded to a multiple of 4 bytes
    pub fn origin(text: &str) -> Self {
        let mut payload = text.as_bytes().to_vec();
        payload.push(0);
        while payload.len() % 4 != 0 {
            payload.push(0);
        }
        Self::Origin(payload)
    }
    pub fn id(&self) -> u16 {
        match self {
            Self::Origin(_) => ChunkId::Origin as u16,
            Self::Instructions(_) => ChunkId::Instructions as u16,
            Self::TargetMachine(_) => ChunkId::TargetMachine as u16,
            Self::ImplicitData(_) => ChunkId::ImplicitData as u16,
            Self::MultiplexedData(_) => ChunkId::MultiplexedData as u16,
            Self::ExplicitData(_) => ChunkId::ExplicitData as u16,
            Self::DefinedData {..} => ChunkId::DefinedData as u16,
            Self::CarrierTone(_) => ChunkId::CarrierTone as u16,
            Self::CarrierToneDummy {..} => ChunkId::CarrierToneDummy as u16,
            Self::IntegerGap(_) => ChunkId::IntegerGap as u16,
            Self::BaseFrequency(_) => ChunkId::BaseFrequency as u16,
            Self::SecurityCycles(_) => ChunkId::SecurityCycles as u16,
            Self::PhaseChange(_) => ChunkId::PhaseChange as u16,
            Self::FloatGap(_) => ChunkId::FloatGap as u16,
            Self::BaudRate(_) => ChunkId::BaudRate as u16,
            Self::PositionMarker(_) => ChunkId::PositionMarker as u16,
            Self::TapeSetInfo(_) => ChunkId::TapeSetInfo as u16,
            Self::TapeSide(_) => ChunkId::TapeSide as u16,
            Self::Disc { id, .. } => *id,
            Self::Opaque { id, .. } => *id
        }
    }
    pub fn payload(&self) -> Vec<u8> {
        match self {
            Self::Origin(v) | Self::Instructions(v) | Self::ImplicitData(v) | Self::MultiplexedData(v) |
            Self::ExplicitData(v) | Self::SecurityCycles(v) | Self::PositionMarker(v) |
            Self::TapeSetInfo(v) | Self::TapeSide(v) => v.clone(),
            Self::TargetMachine(m) => vec![*m],
            Self::DefinedData { bits, parity, stop, data } => [vec![*bits,*parity,*stop],data.clone()].concat(),
            Self::CarrierTone(x) | Self::IntegerGap(x) | Self::PhaseChange(x) | Self::BaudRate(x) => u16::to_le_bytes(*x).to_vec(),
            Self::CarrierToneDummy { before, after } => [u16::to_le_bytes(*before),u16::to_le_bytes(*after)].concat(),
            Self::BaseFrequency(x) | Self::FloatGap(x) => f32::to_le_bytes(*x).to_vec(),
            Self::Disc { payload, .. } | Self::Opaque { payload, .. } => payload.clone()
        }
    }
    /// Bytes of the chunk as it appears in the file, header included
    pub fn to_bytes(&self) -> Vec<u8> {
        let payload = self.payload();
        let mut ans = Vec::with_capacity(HEADER_LEN + payload.len());
        ans.extend_from_slice(&u16::to_le_bytes(self.id()));
        ans.extend_from_slice(&u32::to_le_bytes(payload.len() as u32));
        ans.extend_from_slice(&payload);
        ans
    }
    /// Origin text up to the first NUL, None for other chunks
    pub fn origin_text(&self) -> Option<String> {
        match self {
            Self::Origin(v) => {
                let end = v.iter().position(|b| *b==0).unwrap_or(v.len());
                Some(String::from_utf8_lossy(&v[0..end]).to_string())
            },
            _ => None
        }
    }
    /// True for chunks that carry tape data
    pub fn is_data(&self) -> bool {
        match self {
            Self::ImplicitData(_) | Self::MultiplexedData(_) | Self::ExplicitData(_) | Self::DefinedData {..} => true,
            _ => false
        }
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self,f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let desc = match self {
            Self::Opaque { payload, .. } => format!("unknown [{}]",hex::encode(&payload[0..usize::min(8,payload.len())])),
            Self::Disc {..} => "disc".to_string(),
            Self::Origin(_) => format!("origin `{}`",self.origin_text().unwrap_or_default()),
            Self::BaudRate(b) => format!("baud rate {}",b),
            Self::CarrierTone(c) => format!("carrier tone {} cycles",c),
            Self::IntegerGap(g) => format!("gap {} ms",g),
            Self::FloatGap(g) => format!("gap {} s",g),
            other => match ChunkId::from_u16(other.id()) {
                Some(known) => format!("{:?}",known),
                None => "unknown".to_string()
            }
        };
        write!(f,"{:04X} {}, {} bytes",self.id(),desc,self.payload().len())
    }
}
