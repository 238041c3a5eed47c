use rayon::prelude::*;
use std::collections::BTreeMap;

use crate::cancel::CancelToken;
use crate::error::Error;
use crate::icns::encode_icns;
use crate::ico::encode_ico;
use crate::platform::{ContainerFormat, Platform, PlatformProfile};
use crate::raster::{rasterize_cancelable, SizedBitmap, SourceImage};

/// One file produced for a platform, ready to be offered as a download or
/// written to disk by the caller.
pub struct GeneratedFile {
    /// Suggested file name, e.g. `icon.ico` or `32x32.png`.
    pub name: String,
    /// The complete encoded file contents.
    pub data: Vec<u8>,
    /// The format of this file's contents.
    pub format: ContainerFormat,
    /// Human-readable size label, e.g. `"32x32"` or `"7 sizes"`.
    pub dimensions: Option<String>,
}

impl GeneratedFile {
    /// Returns the encoded length of the file, in bytes.
    pub fn byte_length(&self) -> usize {
        self.data.len()
    }
}

/// The outcome of one platform's conversion branch. Branches are
/// independent: a failed platform never blocks or invalidates another.
pub struct ConversionResult {
    /// The platform this result belongs to.
    pub platform: Platform,
    /// The files produced; empty when the branch failed.
    pub files: Vec<GeneratedFile>,
    /// Whether the branch produced its files.
    pub success: bool,
    /// The branch's failure message, if any.
    pub error: Option<String>,
}

impl ConversionResult {
    fn ok(platform: Platform, files: Vec<GeneratedFile>) -> ConversionResult {
        ConversionResult { platform, files, success: true, error: None }
    }

    fn failed(platform: Platform, err: &Error) -> ConversionResult {
        ConversionResult {
            platform,
            files: Vec::new(),
            success: false,
            error: Some(err.to_string()),
        }
    }
}

/// Converts a source image into icon files for each requested platform.
///
/// The source is rasterized once at the union of all platforms' required
/// sizes, then each platform branch packages its subset of the bitmaps in
/// parallel. Results come back in request order (duplicates removed), one
/// per platform, each succeeding or failing on its own.
pub fn convert(source: &SourceImage, platforms: &[Platform]) -> Vec<ConversionResult> {
    convert_cancelable(source, platforms, &CancelToken::new())
}

/// Like [`convert`], but abandons work not yet started once the token is
/// canceled; branches skipped this way report [`Error::Canceled`].
pub fn convert_cancelable(
    source: &SourceImage,
    platforms: &[Platform],
    cancel: &CancelToken,
) -> Vec<ConversionResult> {
    let platforms = dedup_platforms(platforms);
    let sizes = union_sizes(&platforms);
    log::debug!("rasterizing {} sizes for {} platforms", sizes.len(), platforms.len());
    let bitmaps = rasterize_cancelable(source, &sizes, cancel);
    platforms
        .par_iter()
        .map(|&platform| convert_platform(platform, &bitmaps, cancel))
        .collect()
}

/// Deduplicates the requested platforms, keeping first-seen order.
fn dedup_platforms(platforms: &[Platform]) -> Vec<Platform> {
    let mut seen = Vec::with_capacity(platforms.len());
    for &platform in platforms {
        if !seen.contains(&platform) {
            seen.push(platform);
        }
    }
    seen
}

/// Computes the deduplicated union of the platforms' required sizes,
/// keeping first-seen order.
fn union_sizes(platforms: &[Platform]) -> Vec<u32> {
    let mut sizes = Vec::new();
    for platform in platforms {
        for &size in platform.profile().required_sizes {
            if !sizes.contains(&size) {
                sizes.push(size);
            }
        }
    }
    sizes
}

fn convert_platform(
    platform: Platform,
    bitmaps: &BTreeMap<u32, SizedBitmap>,
    cancel: &CancelToken,
) -> ConversionResult {
    if cancel.is_canceled() {
        return ConversionResult::failed(platform, &Error::Canceled);
    }
    match encode_platform(platform.profile(), bitmaps) {
        Ok(files) => ConversionResult::ok(platform, files),
        Err(err) => {
            log::warn!("{} branch failed: {}", platform, err);
            ConversionResult::failed(platform, &err)
        }
    }
}

fn encode_platform(
    profile: &PlatformProfile,
    bitmaps: &BTreeMap<u32, SizedBitmap>,
) -> Result<Vec<GeneratedFile>, Error> {
    let selected = select_bitmaps(profile, bitmaps)?;
    let files = match profile.format {
        ContainerFormat::Ico => {
            let data = encode_ico(&selected)?;
            vec![GeneratedFile {
                name: "icon.ico".to_string(),
                data,
                format: ContainerFormat::Ico,
                dimensions: Some(format!("{} sizes", selected.len())),
            }]
        }
        ContainerFormat::Icns => {
            let data = encode_icns(&selected)?;
            vec![GeneratedFile {
                name: "icon.icns".to_string(),
                data,
                format: ContainerFormat::Icns,
                dimensions: None,
            }]
        }
        ContainerFormat::PngSet => selected
            .iter()
            .map(|bitmap| GeneratedFile {
                name: format!("{0}x{0}.png", bitmap.size()),
                data: bitmap.data().to_vec(),
                format: ContainerFormat::PngSet,
                dimensions: Some(format!("{0}x{0}", bitmap.size())),
            })
            .collect(),
    };
    Ok(files)
}

/// Picks the profile's required bitmaps out of the rasterized set, in the
/// profile's declared size order.
fn select_bitmaps<'a>(
    profile: &PlatformProfile,
    bitmaps: &'a BTreeMap<u32, SizedBitmap>,
) -> Result<Vec<&'a SizedBitmap>, Error> {
    profile
        .required_sizes
        .iter()
        .map(|&size| bitmaps.get(&size).ok_or(Error::MissingSize { size }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::PNG_SIGNATURE;

    fn fake_bitmaps(sizes: &[u32]) -> BTreeMap<u32, SizedBitmap> {
        sizes
            .iter()
            .map(|&size| {
                let mut data = PNG_SIGNATURE.to_vec();
                data.extend_from_slice(&size.to_be_bytes());
                (size, SizedBitmap::new(size, data))
            })
            .collect()
    }

    #[test]
    fn union_sizes_covers_all_platforms_once() {
        let sizes = union_sizes(&[Platform::Windows, Platform::MacOs, Platform::Linux]);
        let mut sorted = sizes.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), sizes.len());
        assert_eq!(sorted, vec![16, 24, 32, 48, 64, 96, 128, 256, 512, 1024]);
    }

    #[test]
    fn duplicate_platform_requests_collapse() {
        assert_eq!(
            dedup_platforms(&[Platform::Linux, Platform::Windows, Platform::Linux]),
            vec![Platform::Linux, Platform::Windows]
        );
    }

    #[test]
    fn missing_required_size_fails_only_that_branch() {
        // Everything Windows needs except 48.
        let mut sizes = Platform::Windows.profile().required_sizes.to_vec();
        sizes.retain(|&size| size != 48);
        let bitmaps = fake_bitmaps(&sizes);
        match encode_platform(Platform::Windows.profile(), &bitmaps) {
            Err(Error::MissingSize { size: 48 }) => {}
            other => panic!("expected MissingSize, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn png_set_branch_emits_named_files() {
        let bitmaps = fake_bitmaps(Platform::Linux.profile().required_sizes);
        let files = encode_platform(Platform::Linux.profile(), &bitmaps).unwrap();
        assert_eq!(files.len(), 8);
        assert_eq!(files[0].name, "16x16.png");
        assert_eq!(files[7].name, "512x512.png");
        assert_eq!(files[0].dimensions.as_deref(), Some("16x16"));
        for file in &files {
            assert_eq!(file.format, ContainerFormat::PngSet);
        }
    }

    #[test]
    fn ico_branch_emits_one_container() {
        let bitmaps = fake_bitmaps(Platform::Windows.profile().required_sizes);
        let files = encode_platform(Platform::Windows.profile(), &bitmaps).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "icon.ico");
        assert_eq!(files[0].format, ContainerFormat::Ico);
        assert_eq!(files[0].dimensions.as_deref(), Some("7 sizes"));
    }

    #[test]
    fn canceled_run_reports_canceled_branches() {
        let bitmaps = fake_bitmaps(&[16]);
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = convert_platform(Platform::Linux, &bitmaps, &cancel);
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some(Error::Canceled.to_string().as_str()));
    }
}
