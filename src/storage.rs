//! Filesystem layout and content-type helpers.
//!
//! Every probed code that gets a 200 owns one directory, `<out>/<code>/`,
//! holding either a single saved response file or a rewritten HTML page
//! plus its localized assets.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use url::Url;

/// Create (if needed) and return the per-code directory.
pub fn code_dir(out_dir: &Path, code: &str) -> Result<PathBuf> {
    let dir = out_dir.join(code);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create code dir: {}", dir.display()))?;
    Ok(dir)
}

/// Guess a file extension (dot included) from a declared content type.
///
/// Returns an empty string when nothing sensible can be derived, matching
/// the save-with-no-extension behavior for unknown types.
pub fn extension_for(content_type: &str) -> String {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    let known = match essence.as_str() {
        "image/jpeg" => Some("jpg"),
        "image/svg+xml" => Some("svg"),
        "image/x-icon" | "image/vnd.microsoft.icon" => Some("ico"),
        "video/quicktime" => Some("mov"),
        "video/mpeg" => Some("mpg"),
        "video/x-matroska" => Some("mkv"),
        "video/ogg" => Some("ogv"),
        _ => None,
    };
    if let Some(ext) = known {
        return format!(".{ext}");
    }

    // For the common case the subtype is the extension (png, gif, webp,
    // mp4, webm, ...). Anything with punctuation in it is not a usable
    // extension.
    match essence.split_once('/') {
        Some((_, subtype))
            if !subtype.is_empty() && subtype.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            format!(".{subtype}")
        }
        _ => String::new(),
    }
}

/// Extension (dot included) from the MIME subtype of a `data:` URI header,
/// e.g. `data:image/png;base64` yields `.png`.
pub fn extension_for_data_uri(header: &str) -> String {
    let subtype = header
        .rsplit('/')
        .next()
        .unwrap_or("")
        .split(';')
        .next()
        .unwrap_or("");
    if subtype.is_empty() {
        String::new()
    } else {
        format!(".{subtype}")
    }
}

/// Last path segment of an asset URL, used as the local filename.
///
/// Query strings and fragments are dropped. Falls back to `"asset"` when
/// the path has no usable final segment (e.g. a bare host).
pub fn url_basename(src: &str) -> String {
    if let Ok(url) = Url::parse(src) {
        if let Some(segments) = url.path_segments() {
            if let Some(last) = segments.filter(|s| !s.is_empty()).last() {
                return last.to_string();
            }
        }
        return "asset".to_string();
    }

    // Relative or otherwise unparseable reference: basename by hand.
    let path = src.split(&['?', '#'][..]).next().unwrap_or("");
    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => "asset".to_string(),
    }
}

/// Stream a response body to disk chunk-by-chunk, bounding memory for
/// large payloads. Returns the number of bytes written.
pub async fn write_streamed(mut resp: reqwest::Response, path: &Path) -> Result<u64> {
    let mut file = tokio::fs::File::create(path)
        .await
        .with_context(|| format!("failed to create {}", path.display()))?;

    let mut written = 0u64;
    while let Some(chunk) = resp
        .chunk()
        .await
        .with_context(|| format!("stream read failed while writing {}", path.display()))?
    {
        file.write_all(&chunk)
            .await
            .with_context(|| format!("write failed: {}", path.display()))?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}
