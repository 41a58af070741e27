//! # Checksums
//!
//! Acorn tape blocks are protected by a 16 bit CRC, and the ADFS free space
//! map carries check bytes, one per old map sector or one per new map zone.
//! All functions here are pure and accept any input, including empty input.

const CRC16_POLY: u16 = 0x1021;

const fn crc16_table() -> [u16;256] {
    let mut tab = [0u16;256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut bit = 0;
        while bit < 8 {
            crc = match crc & 0x8000 {
                0 => crc << 1,
                _ => (crc << 1) ^ CRC16_POLY
            };
            bit += 1;
        }
        tab[i] = crc;
        i += 1;
    }
    tab
}

const CRC16_TAB: [u16;256] = crc16_table();

/// Calculate the CRC of an Acorn tape block header or data section.
/// This is CRC-16 with polynomial 0x1021, zero seed, most significant bit first.
/// The tape stores the result high byte first.
pub fn crc16(buf: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for b in buf {
        crc = CRC16_TAB[(((crc >> 8) as u8) ^ *b) as usize] ^ (crc << 8);
    }
    crc
}

/// Check byte of an old map sector, computed over bytes 0..=254.
/// Sectors shorter than 255 bytes are summed as far as they go.
pub fn old_map_check(sector: &[u8]) -> u8 {
    let mut sum: u32 = 255;
    for b in sector.iter().take(255).rev() {
        if sum > 255 {
            sum = (sum & 0xff) + 1;
        }
        sum += *b as u32;
    }
    (sum & 0xff) as u8
}

/// Check byte of a new map zone.  The zone is one sector, and its first byte
/// is the check byte itself, which is excluded from the sum.
/// Zones shorter than 4 bytes, or not a multiple of 4, yield 0.
pub fn zone_check(zone: &[u8]) -> u8 {
    if zone.len() < 4 || zone.len() % 4 != 0 {
        return 0;
    }
    let mut sum: [u32;4] = [0;4];
    let mut rover = zone.len() - 4;
    while rover > 0 {
        sum[0] += zone[rover] as u32 + (sum[3] >> 8);
        sum[3] &= 0xff;
        sum[1] += zone[rover+1] as u32 + (sum[0] >> 8);
        sum[0] &= 0xff;
        sum[2] += zone[rover+2] as u32 + (sum[1] >> 8);
        sum[1] &= 0xff;
        sum[3] += zone[rover+3] as u32 + (sum[2] >> 8);
        sum[2] &= 0xff;
        rover -= 4;
    }
    sum[0] += sum[3] >> 8;
    sum[1] += zone[1] as u32 + (sum[0] >> 8);
    sum[2] += zone[2] as u32 + (sum[1] >> 8);
    sum[3] += zone[3] as u32 + (sum[2] >> 8);
    ((sum[0] ^ sum[1] ^ sum[2] ^ sum[3]) & 0xff) as u8
}
