use std::path::Path;

/// Video container extensions, lowercase without the leading dot.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "avi", "mpg", "mpeg", "mpe", "m1v", "m2v", "mpv2", "mp2v", "pva", "evo", "m2p", "ts", "tp",
    "trp", "m2t", "m2ts", "mts", "rec", "ssif", "vob", "ifo", "mkv", "mk3d", "webm", "mp4", "m4v",
    "mp4v", "mpv4", "hdmov", "mov", "3gp", "3gpp", "3g2", "3gp2", "flv", "f4v", "ogm", "ogv",
    "rm", "rmvb", "ram", "wmv", "wmp", "wm", "asf", "smk", "bik", "fli", "flc", "flic", "dsm",
    "dsv", "dsa", "dss", "ivf", "divx", "amv", "mxf", "dv", "dav", "mpls", "bdmv", "swf",
];

/// True when the file name carries an allow-listed extension (case-insensitive).
pub fn is_video_name(name: impl AsRef<Path>) -> bool {
    name.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            VIDEO_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}
