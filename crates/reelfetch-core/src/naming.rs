//! Filename derivation, sanitisation, and human-readable formatting.
//!
//! # Design
//! - Pure functions; the transfer engine supplies the "is this name taken"
//!   predicate so collision checks can include in-flight reservations.
//! - Byte formatting uses binary multiples with one decimal, dropping a
//!   trailing `.0` (`1536` renders as `1.5 KB`, `1024` as `1 KB`).

use chrono::Utc;
use url::Url;

/// Name used when nothing usable can be derived.
pub const FALLBACK_FILENAME: &str = "download";

const FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
/// Longest stem kept, in bytes; leaves room for the collision suffix.
const MAX_STEM_BYTES: usize = 200;
/// Longer "extensions" are treated as part of the stem when truncating.
const MAX_EXTENSION_BYTES: usize = 16;
const BYTE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Derive a filename from the last non-empty path segment of `url`.
///
/// Percent-encoded segments are decoded; an undecodable segment is used as is.
#[must_use]
pub fn filename_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.rfind(|segment| !segment.is_empty()))
        .map(|segment| {
            urlencoding::decode(segment)
                .map_or_else(|_| segment.to_string(), std::borrow::Cow::into_owned)
        })
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string())
}

/// Extension of `name` including the leading dot, if it has one.
///
/// Leading dots (`.bashrc`) and trailing dots (`name.`) do not count.
#[must_use]
pub fn extension(name: &str) -> Option<&str> {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => Some(&name[idx..]),
        _ => None,
    }
}

/// Split `name` into stem and extension (extension includes the dot).
#[must_use]
pub fn split_stem(name: &str) -> (&str, &str) {
    extension(name).map_or((name, ""), |ext| (&name[..name.len() - ext.len()], ext))
}

/// Keep `custom` as is when it has an extension, otherwise borrow the
/// extension of `original`.
#[must_use]
pub fn preserve_extension(custom: &str, original: &str) -> String {
    if extension(custom).is_some() {
        return custom.to_string();
    }
    match extension(original) {
        Some(ext) => format!("{custom}{ext}"),
        None => custom.to_string(),
    }
}

/// Replace path-hostile and control characters with `_`, collapse
/// whitespace runs, trim, and cap the stem length.
///
/// Never returns an empty string or a bare `.`/`..`.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|ch| {
            let hostile =
                FORBIDDEN_CHARS.contains(&ch) || (ch.is_control() && !ch.is_whitespace());
            if hostile { '_' } else { ch }
        })
        .collect();
    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.as_str() {
        "" | "." | ".." => FALLBACK_FILENAME.to_string(),
        _ => truncate_stem(&collapsed),
    }
}

fn truncate_stem(name: &str) -> String {
    let (stem, ext) = match split_stem(name) {
        (stem, ext) if ext.len() <= MAX_EXTENSION_BYTES => (stem, ext),
        _ => (name, ""),
    };
    if stem.len() <= MAX_STEM_BYTES {
        return name.to_string();
    }
    let cut = (0..=MAX_STEM_BYTES)
        .rev()
        .find(|idx| stem.is_char_boundary(*idx))
        .unwrap_or(0);
    format!("{}{ext}", stem[..cut].trim_end())
}

/// Resolve the final destination name for a submission.
#[must_use]
pub fn resolve_filename(url: &Url, custom: Option<&str>) -> String {
    let original = filename_from_url(url);
    let chosen = match custom.map(str::trim).filter(|value| !value.is_empty()) {
        Some(custom) => preserve_extension(custom, &original),
        None => original,
    };
    sanitize_filename(&chosen)
}

/// Return `name` when free, otherwise `<stem>_<millis><ext>`, adding a
/// `_<n>` counter if that is also taken.
pub fn unique_filename(name: &str, millis: i64, is_taken: impl Fn(&str) -> bool) -> String {
    if !is_taken(name) {
        return name.to_string();
    }
    let (stem, ext) = split_stem(name);
    let candidate = format!("{stem}_{millis}{ext}");
    if !is_taken(&candidate) {
        return candidate;
    }
    let mut counter = 1_u32;
    loop {
        let candidate = format!("{stem}_{millis}_{counter}{ext}");
        if !is_taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Render a byte count with binary units (`0 B`, `1.5 KB`, `3 MB`).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rendered = format!("{value:.1}");
    let rendered = rendered.strip_suffix(".0").unwrap_or(&rendered);
    format!("{rendered} {}", BYTE_UNITS[unit])
}

/// Render a transfer rate in bytes per second.
#[must_use]
pub fn format_rate(bytes_per_sec: u64) -> String {
    format!("{}/s", format_bytes(bytes_per_sec))
}

/// Current UTC time as `YYYY-MM-DD HH:MM:SS`.
#[must_use]
pub fn timestamp_now() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Milliseconds since the Unix epoch.
#[must_use]
pub fn unix_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn url(raw: &str) -> Url {
        Url::parse(raw).expect("test url parses")
    }

    #[test]
    fn filename_comes_from_last_segment() {
        assert_eq!(filename_from_url(&url("https://x.test/a/b/movie.mkv")), "movie.mkv");
        assert_eq!(filename_from_url(&url("https://x.test/a/b/")), "b");
        assert_eq!(
            filename_from_url(&url("https://x.test/My%20Film.mp4?token=1")),
            "My Film.mp4"
        );
    }

    #[test]
    fn filename_falls_back_for_bare_hosts() {
        assert_eq!(filename_from_url(&url("https://x.test")), FALLBACK_FILENAME);
        assert_eq!(filename_from_url(&url("https://x.test/")), FALLBACK_FILENAME);
        assert_eq!(filename_from_url(&url("https://x.test/%20")), FALLBACK_FILENAME);
    }

    #[test]
    fn extension_ignores_dotfiles_and_trailing_dots() {
        assert_eq!(extension("clip.mp4"), Some(".mp4"));
        assert_eq!(extension("archive.tar.gz"), Some(".gz"));
        assert_eq!(extension(".hidden"), None);
        assert_eq!(extension("name."), None);
        assert_eq!(extension("plain"), None);
    }

    #[test]
    fn custom_name_borrows_original_extension() {
        assert_eq!(preserve_extension("Holiday", "clip.mp4"), "Holiday.mp4");
        assert_eq!(preserve_extension("Holiday.mkv", "clip.mp4"), "Holiday.mkv");
        assert_eq!(preserve_extension("Holiday", "clip"), "Holiday");
    }

    #[test]
    fn sanitize_strips_forbidden_characters_and_whitespace_runs() {
        let cleaned = sanitize_filename("  a<b>c:d\"e/f\\g|h?i*j \t\n  k  ");
        assert_eq!(cleaned, "a_b_c_d_e_f_g_h_i_j k");
        for forbidden in FORBIDDEN_CHARS {
            assert!(!cleaned.contains(*forbidden));
        }
        assert!(!cleaned.contains("  "));
    }

    #[test]
    fn sanitize_never_yields_empty_or_traversal_names() {
        assert_eq!(sanitize_filename("   "), FALLBACK_FILENAME);
        assert_eq!(sanitize_filename(".."), FALLBACK_FILENAME);
        assert_eq!(sanitize_filename("../etc"), ".._etc");
    }

    #[test]
    fn decoded_control_characters_are_replaced() {
        let source = url("http://127.0.0.1:9/a%00b%0Ac%07d.mp4");
        let name = resolve_filename(&source, None);
        assert_eq!(name, "a_b c_d.mp4");
        assert!(!name.chars().any(char::is_control));
    }

    #[test]
    fn long_names_are_cut_on_a_char_boundary_keeping_the_extension() {
        let long = format!("{}.mkv", "é".repeat(150));
        let name = sanitize_filename(&long);
        assert!(name.ends_with(".mkv"));
        assert_eq!(name.len(), MAX_STEM_BYTES + ".mkv".len());

        let source = url(&format!("https://cdn.test/{}.mp4", "a".repeat(300)));
        let name = resolve_filename(&source, None);
        assert_eq!(name, format!("{}.mp4", "a".repeat(MAX_STEM_BYTES)));

        let odd = format!("x.{}", "b".repeat(250));
        assert_eq!(sanitize_filename(&odd).len(), MAX_STEM_BYTES);
    }

    #[test]
    fn resolve_filename_combines_custom_name_and_sanitising() {
        let source = url("https://cdn.test/v/video.mp4");
        assert_eq!(resolve_filename(&source, None), "video.mp4");
        assert_eq!(resolve_filename(&source, Some("My: Film")), "My_ Film.mp4");
        assert_eq!(resolve_filename(&source, Some("   ")), "video.mp4");
    }

    #[test]
    fn unique_filename_appends_timestamp_then_counter() {
        let taken: HashSet<&str> = ["video.mp4", "video_42.mp4"].into_iter().collect();
        assert_eq!(unique_filename("other.mp4", 42, |n| taken.contains(n)), "other.mp4");
        assert_eq!(unique_filename("video.mp4", 7, |n| taken.contains(n)), "video_7.mp4");
        assert_eq!(
            unique_filename("video.mp4", 42, |n| taken.contains(n)),
            "video_42_1.mp4"
        );
        assert_eq!(unique_filename("noext", 7, |n| n == "noext"), "noext_7");
    }

    #[test]
    fn format_bytes_uses_binary_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3 MB");
        assert_eq!(format_bytes(5 * 1024_u64.pow(5)), "5120 TB");
        assert_eq!(format_rate(2048), "2 KB/s");
    }

    #[test]
    fn timestamp_has_expected_shape() {
        let stamp = timestamp_now();
        assert_eq!(stamp.len(), 19);
        assert_eq!(&stamp[4..5], "-");
        assert_eq!(&stamp[10..11], " ");
        assert!(unix_millis() > 0);
    }
}
