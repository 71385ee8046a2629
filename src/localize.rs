//! HTML asset localization.
//!
//! A returned HTML page may embed images (inline base64 data URIs or remote
//! URLs) and videos. Localization saves every asset it can next to the page
//! and rewrites the element `src` attributes to the local filenames, so the
//! archived page renders offline. Assets that cannot be fetched or decoded
//! keep their original reference — a dangling `src` never aborts the page
//! save.
//!
//! Inline-image ordinals are assigned from a snapshot of the element list
//! taken before any rewriting, so `image_<n>.<ext>` numbering always
//! follows original document order.

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use scraper::{Html, Node, Selector};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::client::HttpClient;
use crate::storage;

/// One `src`-bearing element captured from the unmutated document.
///
/// `ordinal` is the element's position among *all* elements of its tag in
/// document order, including ones without a `src` attribute.
struct AssetRef {
    ordinal: usize,
    src: String,
}

/// Localize every image and video referenced by `html` into `code_dir`,
/// then write the rewritten document as `<code>.html` there.
///
/// Returns the path of the written HTML file.
pub async fn localize_html(
    client: &HttpClient,
    code_dir: &Path,
    code: &str,
    html: &str,
) -> Result<PathBuf> {
    let (images, videos) = collect_refs(html);
    debug!(
        code,
        images = images.len(),
        videos = videos.len(),
        "localizing html assets"
    );

    let mut image_rewrites: HashMap<usize, String> = HashMap::new();
    for asset in &images {
        match localize_image(client, code_dir, asset).await {
            Ok(Some(filename)) => {
                image_rewrites.insert(asset.ordinal, filename);
            }
            Ok(None) => debug!(src = %asset.src, "image not saved; keeping original reference"),
            Err(e) => warn!(src = %asset.src, "image localization failed: {e:#}"),
        }
    }

    let mut video_rewrites: HashMap<usize, String> = HashMap::new();
    for asset in &videos {
        match localize_video(client, code_dir, asset).await {
            Ok(Some(filename)) => {
                video_rewrites.insert(asset.ordinal, filename);
            }
            Ok(None) => debug!(src = %asset.src, "video not saved; keeping original reference"),
            Err(e) => warn!(src = %asset.src, "video localization failed: {e:#}"),
        }
    }

    let rewritten = apply_rewrites(html, &image_rewrites, &video_rewrites);

    let path = code_dir.join(format!("{code}.html"));
    tokio::fs::write(&path, rewritten)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Snapshot the `src` attributes of all `<img>` and `<video>` elements in
/// document order, before anything is rewritten.
fn collect_refs(html: &str) -> (Vec<AssetRef>, Vec<AssetRef>) {
    let doc = Html::parse_document(html);
    (
        refs_for(&doc, "img"),
        refs_for(&doc, "video"),
    )
}

fn refs_for(doc: &Html, tag: &str) -> Vec<AssetRef> {
    let sel = Selector::parse(tag).unwrap();
    doc.select(&sel)
        .enumerate()
        .filter_map(|(ordinal, el)| {
            el.value().attr("src").map(|src| AssetRef {
                ordinal,
                src: src.to_string(),
            })
        })
        .collect()
}

/// Save one image asset. Returns the local filename on success, `None` when
/// the asset is intentionally skipped (non-200 fetch).
async fn localize_image(
    client: &HttpClient,
    code_dir: &Path,
    asset: &AssetRef,
) -> Result<Option<String>> {
    if let Some(rest) = asset.src.strip_prefix("data:image") {
        // Inline base64 payload: "data:image/<subtype>;base64,<payload>"
        let (header, payload) = rest
            .split_once(',')
            .context("data URI has no comma separator")?;
        let bytes = BASE64
            .decode(payload.trim().as_bytes())
            .context("data URI payload is not valid base64")?;

        let ext = storage::extension_for_data_uri(header);
        let filename = format!("image_{}{ext}", asset.ordinal);
        tokio::fs::write(code_dir.join(&filename), bytes)
            .await
            .with_context(|| format!("failed to write inline image {filename}"))?;
        return Ok(Some(filename));
    }

    let resp = client.get(&asset.src).await?;
    if resp.status().as_u16() != 200 {
        return Ok(None);
    }

    let filename = storage::url_basename(&asset.src);
    let bytes = resp.bytes().await.context("image body read failed")?;
    tokio::fs::write(code_dir.join(&filename), bytes)
        .await
        .with_context(|| format!("failed to write image {filename}"))?;
    Ok(Some(filename))
}

/// Save one video asset with streamed, chunked transfer.
async fn localize_video(
    client: &HttpClient,
    code_dir: &Path,
    asset: &AssetRef,
) -> Result<Option<String>> {
    let resp = client.get(&asset.src).await?;
    if resp.status().as_u16() != 200 {
        return Ok(None);
    }

    let filename = storage::url_basename(&asset.src);
    storage::write_streamed(resp, &code_dir.join(&filename)).await?;
    Ok(Some(filename))
}

/// Re-parse the original document and patch `src` attributes by ordinal.
///
/// Only attribute values change, never the tree shape, so ordinals computed
/// against the original document still address the same elements.
fn apply_rewrites(
    html: &str,
    image_rewrites: &HashMap<usize, String>,
    video_rewrites: &HashMap<usize, String>,
) -> String {
    let mut doc = Html::parse_document(html);
    patch_tag(&mut doc, "img", image_rewrites);
    patch_tag(&mut doc, "video", video_rewrites);
    // Serialize the whole document, not just the root element: the saved
    // page must keep its doctype or it re-renders in quirks mode.
    doc.html()
}

fn patch_tag(doc: &mut Html, tag: &str, rewrites: &HashMap<usize, String>) {
    let sel = Selector::parse(tag).unwrap();
    let ids: Vec<_> = doc.select(&sel).map(|el| el.id()).collect();

    for (ordinal, filename) in rewrites {
        let Some(&id) = ids.get(*ordinal) else { continue };
        if let Some(mut node) = doc.tree.get_mut(id) {
            if let Node::Element(el) = node.value() {
                for (name, value) in el.attrs.iter_mut() {
                    if name.local.as_ref() == "src" {
                        *value = filename.as_str().into();
                    }
                }
            }
        }
    }
}
