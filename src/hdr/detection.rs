/// Transfer characteristics that mark a stream as HDR, in the player's vocabulary.
const HDR_TRANSFERS: &[&str] = &["pq", "hlg"];

const HDR_PRIMARIES: &str = "bt.2020";

/// Classifies the currently playing stream from its reported color metadata.
///
/// A stream is HDR when its transfer characteristic is PQ or HLG, or when its
/// primaries are BT.2020 regardless of transfer.
pub fn is_hdr(color_transfer: Option<&str>, color_primaries: Option<&str>) -> bool {
    let hdr_transfer = color_transfer.is_some_and(|tf| HDR_TRANSFERS.contains(&tf));
    let hdr_primaries = color_primaries == Some(HDR_PRIMARIES);

    hdr_transfer || hdr_primaries
}

/// Maps an ffprobe `color_transfer` name onto the player's gamma vocabulary.
pub fn normalize_transfer(ffprobe_name: &str) -> String {
    match ffprobe_name {
        "smpte2084" => "pq".to_string(),
        "arib-std-b67" => "hlg".to_string(),
        "bt709" | "bt1361e" => "bt.1886".to_string(),
        "iec61966-2-1" => "srgb".to_string(),
        "linear" => "linear".to_string(),
        other => other.to_string(),
    }
}

/// Maps an ffprobe `color_primaries` name onto the player's primaries vocabulary.
pub fn normalize_primaries(ffprobe_name: &str) -> String {
    match ffprobe_name {
        "bt2020" => "bt.2020".to_string(),
        "bt709" => "bt.709".to_string(),
        "bt470bg" => "bt.601-625".to_string(),
        "smpte170m" | "smpte240m" => "bt.601-525".to_string(),
        "smpte432" => "display-p3".to_string(),
        "smpte431" => "dci-p3".to_string(),
        other => other.to_string(),
    }
}
