//! A small sky around Sirius and Alpheratz in every distribution format.
//!
//! Combined view at the default cutover (4.5 / 7.0 / 10.0):
//!
//! | star | source | merged |
//! |------|--------|--------|
//! | BSC0015, BSC2491 | BSC | yes |
//! | BSC2500 | BSC, 5.5 | no, too faint |
//! | HIP000100, HIP032400, HIP032500 | Hipparcos | yes |
//! | HIP000677, HIP032349 | Hipparcos | no, too bright |
//! | T5949 02900 1 | Tycho-2 | yes |
//! | T5949 02777 1, T5949 02800 1 | Tycho-2 | no, Hipparcos duplicates |
//! | T5949 03000 1 | Tycho-2, 10.6 | no, too faint |
//! | UCAC4-367-000002, UCAC4-367-000003 | UCAC4 | yes |
//! | UCAC4-367-000001 | UCAC4 | no, Tycho-2 duplicate |

#![allow(dead_code)]

use byteorder::{ByteOrder, LittleEndian};
use std::fs;
use std::path::Path;

/// Stars the combined view yields.
pub const MERGED: usize = 8;
/// Records across all file catalogs.
pub const RECORDS: u64 = 3 + 5 + 0 + 4 + 3;

fn line(width: usize, fields: &[(usize, &str)]) -> String {
    let mut buf = vec![b' '; width];
    for (start, text) in fields {
        buf[*start..*start + text.len()].copy_from_slice(text.as_bytes());
    }
    String::from_utf8(buf).unwrap()
}

fn bsc_line(
    number: u16,
    longname: &str,
    ra: (u32, u32, f64),
    dec: (char, u32, u32, u32),
    mag: f32,
) -> String {
    let number = format!("{:4}", number);
    let ra_h = format!("{:02}", ra.0);
    let ra_m = format!("{:02}", ra.1);
    let ra_s = format!("{:04.1}", ra.2);
    let sign = dec.0.to_string();
    let dec_d = format!("{:02}", dec.1);
    let dec_m = format!("{:02}", dec.2);
    let dec_s = format!("{:02}", dec.3);
    let mag = format!("{:5.2}", mag);
    line(
        197,
        &[
            (0, number.as_str()),
            (5, longname),
            (75, ra_h.as_str()),
            (77, ra_m.as_str()),
            (79, ra_s.as_str()),
            (83, sign.as_str()),
            (84, dec_d.as_str()),
            (86, dec_m.as_str()),
            (88, dec_s.as_str()),
            (102, mag.as_str()),
            (148, "+0.000"),
            (154, "+0.000"),
        ],
    )
}

fn hip_record(hip: u32, ra: &str, dec: &str, vmag: &str) -> String {
    let number = format!("{:6}", hip);
    let mut record = line(
        450,
        &[
            (0, "H|"),
            (8, number.as_str()),
            (17, ra),
            (29, dec),
            (41, vmag),
            (87, "    0.00"),
            (96, "    0.00"),
        ],
    );
    record.push('\n');
    record
}

fn tycho2_record(
    id: (u16, u32, u8),
    ra_deg: f64,
    dec_deg: f64,
    vt: f32,
    hip: Option<u32>,
) -> String {
    let key = format!("{:04} {:05} {}", id.0, id.1, id.2);
    let ra = format!("{:12.8}", ra_deg);
    let dec = format!("{:12.8}", dec_deg);
    let bt = format!("{:6.3}", vt + 0.1);
    let vt = format!("{:6.3}", vt);
    let hip = hip.map(|h| format!("{:6}", h)).unwrap_or_default();
    let mut record = line(
        206,
        &[
            (0, key.as_str()),
            (12, "| |"),
            (15, ra.as_str()),
            (28, dec.as_str()),
            (41, "    0.0"),
            (49, "    0.0"),
            (110, bt.as_str()),
            (123, vt.as_str()),
            (142, hip.as_str()),
        ],
    );
    record.push('\n');
    record
}

fn ucac4_record(ra_deg: f64, dec_deg: f64, mag: f32, catalog_flags: u32) -> [u8; 78] {
    let mut record = [0u8; 78];
    LittleEndian::write_i32(&mut record[0..4], (ra_deg * 3_600_000.0).round() as i32);
    LittleEndian::write_i32(&mut record[4..8], ((dec_deg + 90.0) * 3_600_000.0).round() as i32);
    LittleEndian::write_u16(&mut record[8..10], (mag * 1000.0).round() as u16);
    LittleEndian::write_u16(&mut record[10..12], (mag * 1000.0).round() as u16 + 50);
    record[12] = 20;
    LittleEndian::write_u32(&mut record[62..66], catalog_flags);
    record
}

fn hours(h: f64, m: f64) -> f64 {
    (h + m / 60.0) * 15.0
}

/// Write the five file catalogs below `root`.
pub fn write_star_catalogs(root: &Path) {
    for sub in ["bsc", "hipparcos", "sao", "tycho2", "u4/u4b", "u4/u4i"] {
        fs::create_dir_all(root.join(sub)).unwrap();
    }

    let bsc = [
        bsc_line(15, "21Alp And", (0, 8, 23.3), ('+', 29, 5, 26), 2.06),
        bsc_line(2491, " 9Alp CMa", (6, 45, 8.9), ('-', 16, 42, 58), -1.46),
        bsc_line(2500, "", (6, 46, 0.0), ('-', 16, 0, 0), 5.5),
    ]
    .join("\n");
    fs::write(root.join("bsc/catalog"), bsc + "\n").unwrap();
    fs::write(root.join("bsc/notes"), "").unwrap();

    let hip = [
        hip_record(100, "23 59 00.00", "+29 00 00.0", " 6.00"),
        hip_record(677, "00 08 23.26", "+29 05 25.6", " 2.07"),
        hip_record(32349, "06 45 09.25", "-16 42 47.3", "-1.44"),
        hip_record(32400, "06 46 00.00", "-16 00 00.0", " 5.50"),
        hip_record(32500, "06 47 00.00", "-16 30 00.0", " 6.80"),
    ]
    .concat();
    fs::write(root.join("hipparcos/hip_main.dat"), hip).unwrap();
    fs::write(root.join("sao/sao.dat"), "").unwrap();

    let tyc = [
        tycho2_record((5949, 2777, 1), hours(6.0, 45.15), -16.716, -1.4, Some(32349)),
        tycho2_record((5949, 2800, 1), hours(6.0, 47.0), -16.5, 6.8, Some(32500)),
        tycho2_record((5949, 2900, 1), hours(6.0, 48.0), -16.2, 8.5, None),
        tycho2_record((5949, 3000, 1), hours(6.0, 49.0), -16.3, 10.6, None),
    ]
    .concat();
    fs::write(root.join("tycho2/tyc2.dat"), tyc).unwrap();

    // zone 367 covers [-16.8°, -16.6°)
    let zone367: Vec<u8> = [
        ucac4_record(hours(6.0, 48.0), -16.7, 8.5, 300_000_000),
        ucac4_record(hours(6.0, 49.0), -16.75, 10.6, 300_000_000),
        ucac4_record(hours(6.0, 50.0), -16.65, 12.0, 0),
    ]
    .concat();
    fs::write(root.join("u4/u4i/u4index.asc"), b"").unwrap();
    for zone in 1..=900u16 {
        let content: &[u8] = if zone == 367 { &zone367 } else { &[] };
        fs::write(root.join(format!("u4/u4b/z{:03}", zone)), content).unwrap();
    }
}

fn ngc_record(
    name: &str,
    kind: &str,
    ra: (&str, &str),
    dec: (char, &str, &str),
    constellation: &str,
    size: &str,
    mag: &str,
) -> String {
    let sign = dec.0.to_string();
    line(
        96,
        &[
            (0, name),
            (6, kind),
            (10, ra.0),
            (13, ra.1),
            (19, sign.as_str()),
            (20, dec.1),
            (23, dec.2),
            (29, constellation),
            (33, size),
            (40, mag),
        ],
    )
}

/// Write `ngcic/` below `root`; the other deep-sky catalogs stay absent.
pub fn write_deepsky_catalogs(root: &Path) {
    let dir = root.join("ngcic");
    fs::create_dir_all(&dir).unwrap();
    let records = [
        ngc_record(" 7000", "Nb", ("20", "58.8"), ('+', "44", "20"), "Cyg", "120. ", " 4.0"),
        ngc_record("  224", "Gx", ("00", "42.7"), ('+', "41", "16"), "And", "185. ", " 3.5"),
        ngc_record("  221", "Gx", ("00", "42.7"), ('+', "40", "52"), "And", "  8. ", " 8.2"),
        ngc_record("I 434", "Nb", ("05", "41.0"), ('-', "02", "24"), "Ori", " 60. ", "    "),
    ];
    fs::write(dir.join("ngc2000.dat"), records.join("\n") + "\n").unwrap();
    let names = [
        line(41, &[(0, "North America Nebula"), (36, " 7000")]),
        line(41, &[(0, "M 31"), (36, "  224")]),
        line(41, &[(0, "M 32"), (36, "  221")]),
        line(41, &[(0, "Andromeda Galaxy"), (36, "  224")]),
        line(41, &[(0, "Horsehead Nebula"), (36, "I 434")]),
    ];
    fs::write(dir.join("names.dat"), names.join("\n") + "\n").unwrap();
}

/// A base directory with the star and deep-sky catalogs.
pub fn basedir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_star_catalogs(dir.path());
    write_deepsky_catalogs(dir.path());
    dir
}
