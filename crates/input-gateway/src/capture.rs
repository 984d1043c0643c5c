use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::Context;
use screenshots::Screen;

/// Captures the primary screen and encodes it as PNG bytes.
pub(crate) fn capture_primary_png() -> anyhow::Result<Vec<u8>> {
    let screens = Screen::all().map_err(|e| anyhow::anyhow!("enumerate screens: {e}"))?;
    let screen = screens
        .into_iter()
        .next()
        .context("no screen available to capture")?;
    let image = screen
        .capture()
        .map_err(|e| anyhow::anyhow!("capture screen: {e}"))?;

    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, image::ImageOutputFormat::Png)
        .context("encode screenshot as png")?;
    Ok(buffer.into_inner())
}

/// Reduces a model-supplied filename to a bare file name, discarding any path
/// components. Returns `None` when nothing usable remains.
pub(crate) fn sanitize_filename(name: &str) -> Option<String> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let file_name = Path::new(name).file_name()?.to_str()?.to_string();
    if file_name == "." || file_name == ".." {
        return None;
    }
    Some(file_name)
}

pub(crate) fn save_png(output_dir: &Path, file_name: &str, png: &[u8]) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("create output directory {}", output_dir.display()))?;
    let path = output_dir.join(file_name);
    std::fs::write(&path, png).with_context(|| format!("write screenshot {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_path_components() {
        assert_eq!(
            sanitize_filename("../../etc/passwd").as_deref(),
            Some("passwd")
        );
        assert_eq!(
            sanitize_filename("shots/view.png").as_deref(),
            Some("view.png")
        );
        assert_eq!(sanitize_filename("view.png").as_deref(), Some("view.png"));
    }

    #[test]
    fn sanitize_rejects_empty_and_dot_names() {
        assert_eq!(sanitize_filename(""), None);
        assert_eq!(sanitize_filename("   "), None);
        assert_eq!(sanitize_filename(".."), None);
    }
}
