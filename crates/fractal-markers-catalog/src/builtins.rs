//! Embedded marker-set configurations.
//!
//! The blobs under `data/` are fixed byte sequences, byte-compatible with
//! the predefined ArUco fractal configurations, so printed marker sheets in
//! circulation keep working.

/// Names accepted by [`crate::FractalMarkerSet::from_config`].
pub const CONFIG_NAMES: [&str; 4] = [
    "FRACTAL_2L_6",
    "FRACTAL_3L_6",
    "FRACTAL_4L_6",
    "FRACTAL_5L_6",
];

/// Raw blob for a predefined configuration name.
pub fn builtin_config(name: &str) -> Option<&'static [u8]> {
    match name {
        "FRACTAL_2L_6" => Some(include_bytes!("../data/FRACTAL_2L_6.bin")),
        "FRACTAL_3L_6" => Some(include_bytes!("../data/FRACTAL_3L_6.bin")),
        "FRACTAL_4L_6" => Some(include_bytes!("../data/FRACTAL_4L_6.bin")),
        "FRACTAL_5L_6" => Some(include_bytes!("../data/FRACTAL_5L_6.bin")),
        _ => None,
    }
}
