/// Text after the last '.' in `path`, or "" when there is none.
pub fn extension(path: &str) -> &str {
    path.rfind('.').map_or("", |pos| &path[pos + 1..])
}

/// MIME type for a video file name, matched on the exact (case-sensitive)
/// extension. Unknown extensions map to "".
pub fn mime_type(path: &str) -> &'static str {
    match extension(path) {
        "avi" => "video/x-msvideo",
        "mpeg" | "mpg" | "mpe" | "vob" => "video/mpeg",
        "qt" | "mov" => "video/quicktime",
        "asf" | "asx" => "video/x-ms-asf",
        "wm" => "video/x-ms-wm",
        "mp4" => "video/mp4",
        "flv" => "video/x-flv",
        _ => "",
    }
}
