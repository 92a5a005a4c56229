//! The built-in header versions.
//!
//! Version 6 is the classic fixed header: 70 real slots, 15 integer slots,
//! 20 enumerated slots and 5 logical slots, followed by a 192-byte character
//! area. Version 7 keeps that layout and appends 22 double-precision slots
//! which take over the time and position fields.

use std::sync::Arc;

use crate::error::Result;
use crate::schema::{EnumTable, HeaderSchema, HeaderSchemaBuilder};
use crate::time::LeapSecondTable;

pub const VERSION_6: i32 = 6;
pub const VERSION_7: i32 = 7;

pub const V6_SLOTS: usize = 110;
pub const V7_SLOTS: usize = V6_SLOTS + FOOTER.len();
pub const TEXT_LEN: usize = 192;

const REAL_FIELDS: &[(&str, usize)] = &[
    ("delta", 0),
    ("depmin", 1),
    ("depmax", 2),
    ("scale", 3),
    ("odelta", 4),
    ("b", 5),
    ("e", 6),
    ("o", 7),
    ("a", 8),
    ("fmt", 9),
    ("t0", 10),
    ("t1", 11),
    ("t2", 12),
    ("t3", 13),
    ("t4", 14),
    ("t5", 15),
    ("t6", 16),
    ("t7", 17),
    ("t8", 18),
    ("t9", 19),
    ("f", 20),
    ("resp0", 21),
    ("resp1", 22),
    ("resp2", 23),
    ("resp3", 24),
    ("resp4", 25),
    ("resp5", 26),
    ("resp6", 27),
    ("resp7", 28),
    ("resp8", 29),
    ("resp9", 30),
    ("stla", 31),
    ("stlo", 32),
    ("stel", 33),
    ("stdp", 34),
    ("evla", 35),
    ("evlo", 36),
    ("evel", 37),
    ("evdp", 38),
    ("mag", 39),
    ("user0", 40),
    ("user1", 41),
    ("user2", 42),
    ("user3", 43),
    ("user4", 44),
    ("user5", 45),
    ("user6", 46),
    ("user7", 47),
    ("user8", 48),
    ("user9", 49),
    ("dist", 50),
    ("az", 51),
    ("baz", 52),
    ("gcarc", 53),
    ("sb", 54),
    ("sdelta", 55),
    ("depmen", 56),
    ("cmpaz", 57),
    ("cmpinc", 58),
    ("xminimum", 59),
    ("xmaximum", 60),
    ("yminimum", 61),
    ("ymaximum", 62),
];

const INTEGER_FIELDS: &[(&str, usize)] = &[
    ("nzyear", 70),
    ("nzjday", 71),
    ("nzhour", 72),
    ("nzmin", 73),
    ("nzsec", 74),
    ("nzmsec", 75),
    ("nvhdr", 76),
    ("norid", 77),
    ("nevid", 78),
    ("npts", 79),
    ("nsnpts", 80),
    ("nwfid", 81),
    ("nxsize", 82),
    ("nysize", 83),
];

const ENUM_FIELDS: &[(&str, usize)] = &[
    ("iftype", 85),
    ("idep", 86),
    ("iztype", 87),
    ("iinst", 89),
    ("istreg", 90),
    ("ievreg", 91),
    ("ievtyp", 92),
    ("iqual", 93),
    ("isynth", 94),
    ("imagtyp", 95),
    ("imagsrc", 96),
];

const LOGICAL_FIELDS: &[(&str, usize)] = &[
    ("leven", 105),
    ("lpspol", 106),
    ("lovrok", 107),
    ("lcalda", 108),
];

/// Fields moved to the version 7 footer, in footer order.
const FOOTER: [&str; 22] = [
    "delta", "b", "e", "o", "a", "t0", "t1", "t2", "t3", "t4", "t5", "t6", "t7", "t8", "t9", "f",
    "evlo", "evla", "stlo", "stla", "sb", "sdelta",
];

const TEXT_FIELDS: &[(&str, usize, usize)] = &[
    ("kstnm", 0, 7),
    ("kevnm", 8, 23),
    ("khole", 24, 31),
    ("ko", 32, 39),
    ("ka", 40, 47),
    ("kt0", 48, 55),
    ("kt1", 56, 63),
    ("kt2", 64, 71),
    ("kt3", 72, 79),
    ("kt4", 80, 87),
    ("kt5", 88, 95),
    ("kt6", 96, 103),
    ("kt7", 104, 111),
    ("kt8", 112, 119),
    ("kt9", 120, 127),
    ("kf", 128, 135),
    ("kuser0", 136, 143),
    ("kuser1", 144, 151),
    ("kuser2", 152, 159),
    ("kcmpnm", 160, 167),
    ("knetwk", 168, 175),
    ("kdatrd", 176, 183),
    ("kinst", 184, 191),
];

/// Enumeration identifiers; `itime` has code 1.
pub const ENUM_IDS: [&str; 97] = [
    "itime", "irlim", "iamph", "ixy", "iunkn", "idisp", "ivel", "iacc", "ib", "iday", "io", "ia",
    "it0", "it1", "it2", "it3", "it4", "it5", "it6", "it7", "it8", "it9", "iradnv", "itannv",
    "iradev", "itanev", "inorth", "ieast", "ihorza", "idown", "iup", "illlbb", "iwwsn1", "iwwsn2",
    "ihglp", "isro", "inucl", "ipren", "ipostn", "iquake", "ipreq", "ipostq", "ichem", "iother",
    "igood", "iglch", "idrop", "ilowsn", "irldta", "ivolts", "ixyz", "imb", "ims", "iml", "imw",
    "imd", "imx", "ineic", "ipdeq", "ipdew", "ipde", "iisc", "ireb", "iusgs", "ibrk", "icaltech",
    "illnl", "ievloc", "ijsop", "iuser", "iunknown", "iqb", "iqb1", "iqb2", "iqbx", "iqmt", "ieq",
    "ieq1", "ieq2", "ime", "iex", "inu", "inc", "io_", "il", "ir", "it", "iu", "ieq3", "ieq0",
    "iex0", "iqc", "iqb0", "igey", "ilit", "imet", "iodor",
];

/// Offsets from the reference time; a time-qualified wildcard only matches these.
const TIME_FIELDS: [&str; 15] = [
    "b", "e", "o", "a", "f", "t0", "t1", "t2", "t3", "t4", "t5", "t6", "t7", "t8", "t9",
];

const REFERENCE_FIELDS: [&str; 6] = ["nzyear", "nzjday", "nzhour", "nzmin", "nzsec", "nzmsec"];

fn numbered(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{prefix}{i}")).collect()
}

fn with_groups(builder: HeaderSchemaBuilder) -> HeaderSchemaBuilder {
    builder
        .group("t", numbered("t", 10))
        .group("kt", numbered("kt", 10))
        .group("resp", numbered("resp", 10))
        .group("user", numbered("user", 10))
        .group("kuser", numbered("kuser", 3))
        .group("st", ["stla", "stlo", "stel", "stdp"])
        .group("ev", ["evla", "evlo", "evel", "evdp"])
        .group("nz", REFERENCE_FIELDS)
        .group("kname", ["knetwk", "kstnm", "khole", "kcmpnm"])
        .group("cmp", ["cmpaz", "cmpinc"])
        .group("dep", ["depmin", "depmax", "depmen"])
}

fn schema(version: i32, slot_count: usize, leap: Arc<LeapSecondTable>) -> Result<HeaderSchema> {
    let relocated = |name: &str| -> Option<usize> {
        (version >= VERSION_7)
            .then(|| FOOTER.iter().position(|f| *f == name))
            .flatten()
            .map(|offset| V6_SLOTS + offset)
    };

    let mut builder = HeaderSchema::builder(version, slot_count, TEXT_LEN)
        .enum_table(EnumTable::new(1, ENUM_IDS))
        .leap_seconds(leap);

    for &(name, slot) in REAL_FIELDS.iter().chain(INTEGER_FIELDS) {
        builder = builder.numeric(name, relocated(name).unwrap_or(slot));
    }
    for &(name, slot) in ENUM_FIELDS {
        builder = builder.enumerated(name, slot);
    }
    for &(name, slot) in LOGICAL_FIELDS {
        builder = builder.logical(name, slot);
    }
    for &(name, start, end) in TEXT_FIELDS {
        builder = builder.text(name, start..=end);
    }

    with_groups(builder)
        .time_fields(TIME_FIELDS)
        .reference_fields(REFERENCE_FIELDS)
        .builtin_virtuals()
        .build()
}

/// Version 6: the 110-slot header.
pub fn version_6(leap: Arc<LeapSecondTable>) -> Result<HeaderSchema> {
    schema(VERSION_6, V6_SLOTS, leap)
}

/// Version 7: version 6 plus the double-precision footer.
pub fn version_7(leap: Arc<LeapSecondTable>) -> Result<HeaderSchema> {
    schema(VERSION_7, V7_SLOTS, leap)
}
