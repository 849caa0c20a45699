//! Image upload screening.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. the bytes decode as a raster image (by content, not by name)
//! 2. the file is no larger than the configured maximum
//! 3. the file name's extension is on the allow-list
//!
//! An accepted file gets a `<unix seconds>_<basename>` name under its
//! destination directory. Writing it is [`UploadStorage`]'s job, which
//! falls back to [`AcceptedFile::numbered`] when the name is taken.
//!
//! [`UploadStorage`]: super::storage::UploadStorage

use std::io::Cursor;

use image::ImageReader;
use thiserror::Error;

use crate::config::DEFAULT_MAX_UPLOAD_BYTES;

/// Extensions accepted after an image decodes.
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// URL prefix under which the upload root is served.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Why an upload was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("The uploaded file is not a valid image.")]
    NotAnImage,

    #[error("The image is {size} bytes; the limit is {max} bytes.")]
    TooLarge { size: u64, max: u64 },

    #[error("Only JPG, JPEG, PNG, GIF and WEBP images are allowed.")]
    UnsupportedType { extension: String },
}

/// Where under the upload root a file lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadDirectory {
    Menu,
    Site,
}

impl UploadDirectory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Menu => "menu",
            Self::Site => "site",
        }
    }
}

/// A file received from a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied file name.
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// A screened file and where it should be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedFile {
    pub directory: UploadDirectory,
    /// Generated name, `<unix seconds>_<basename>`.
    pub file_name: String,
    /// Public path, `/uploads/<directory>/<file_name>`.
    pub relative_path: String,
    pub width: u32,
    pub height: u32,
}

impl AcceptedFile {
    /// The same file named as copy `copy`: `<stem>-<copy>.<ext>`.
    #[must_use]
    pub fn numbered(&self, copy: u32) -> Self {
        let file_name = match self.file_name.rsplit_once('.') {
            Some((stem, ext)) => format!("{stem}-{copy}.{ext}"),
            None => format!("{}-{copy}", self.file_name),
        };
        Self {
            relative_path: format!("{PUBLIC_PREFIX}/{}/{file_name}", self.directory.as_str()),
            file_name,
            ..self.clone()
        }
    }
}

/// Screens uploaded images.
#[derive(Debug, Clone, Copy)]
pub struct UploadValidator {
    max_bytes: u64,
}

impl Default for UploadValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UPLOAD_BYTES)
    }
}

impl UploadValidator {
    #[must_use]
    pub const fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    #[must_use]
    pub const fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Screen `file` for `directory`, naming it after the current time.
    ///
    /// # Errors
    ///
    /// Returns the first [`UploadRejection`] that applies.
    pub fn validate(
        &self,
        file: &UploadedFile,
        directory: UploadDirectory,
    ) -> Result<AcceptedFile, UploadRejection> {
        self.validate_at(file, directory, chrono::Utc::now().timestamp())
    }

    /// Screen `file`, naming it with the given unix timestamp.
    ///
    /// # Errors
    ///
    /// Returns the first [`UploadRejection`] that applies.
    pub fn validate_at(
        &self,
        file: &UploadedFile,
        directory: UploadDirectory,
        timestamp: i64,
    ) -> Result<AcceptedFile, UploadRejection> {
        let (width, height) = ImageReader::new(Cursor::new(&file.bytes))
            .with_guessed_format()
            .map_err(|_| UploadRejection::NotAnImage)?
            .into_dimensions()
            .map_err(|_| UploadRejection::NotAnImage)?;

        let size = u64::try_from(file.bytes.len()).unwrap_or(u64::MAX);
        if size > self.max_bytes {
            return Err(UploadRejection::TooLarge {
                size,
                max: self.max_bytes,
            });
        }

        let basename = basename(&file.file_name);
        let extension = basename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(UploadRejection::UnsupportedType { extension });
        }

        let file_name = format!("{timestamp}_{basename}");
        let relative_path = format!("{PUBLIC_PREFIX}/{}/{file_name}", directory.as_str());
        Ok(AcceptedFile {
            directory,
            file_name,
            relative_path,
            width,
            height,
        })
    }
}

/// Final path component of a client-supplied name, for either separator.
fn basename(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(4, 3, image::Rgb([200, 40, 40]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn upload(name: &str, bytes: Vec<u8>) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            bytes,
        }
    }

    #[test]
    fn test_accepts_png() {
        let accepted = UploadValidator::default()
            .validate_at(&upload("Oysters.PNG", png_bytes()), UploadDirectory::Menu, 1_700_000_000)
            .unwrap();

        assert_eq!(accepted.file_name, "1700000000_Oysters.PNG");
        assert_eq!(accepted.relative_path, "/uploads/menu/1700000000_Oysters.PNG");
        assert_eq!((accepted.width, accepted.height), (4, 3));
    }

    #[test]
    fn test_numbered_copy_keeps_extension() {
        let accepted = UploadValidator::default()
            .validate_at(&upload("dish.jpeg", png_bytes()), UploadDirectory::Site, 42)
            .unwrap();

        let copy = accepted.numbered(3);
        assert_eq!(copy.file_name, "42_dish-3.jpeg");
        assert_eq!(copy.relative_path, "/uploads/site/42_dish-3.jpeg");
        assert_eq!(copy.directory, UploadDirectory::Site);
    }

    #[test]
    fn test_rejects_non_image_first() {
        let result = UploadValidator::new(1)
            .validate(&upload("notes.exe", b"hello world".to_vec()), UploadDirectory::Menu);
        assert_eq!(result, Err(UploadRejection::NotAnImage));
    }

    #[test]
    fn test_six_mib_png_too_large() {
        let mut bytes = png_bytes();
        bytes.resize(6 * 1024 * 1024, 0);

        let result = UploadValidator::default().validate(&upload("big.png", bytes), UploadDirectory::Site);
        assert_eq!(
            result,
            Err(UploadRejection::TooLarge {
                size: 6 * 1024 * 1024,
                max: 5 * 1024 * 1024,
            })
        );
    }

    #[test]
    fn test_size_checked_before_extension() {
        let mut bytes = png_bytes();
        bytes.resize(6 * 1024 * 1024, 0);

        let result = UploadValidator::default().validate(&upload("big.txt", bytes), UploadDirectory::Menu);
        assert!(matches!(result, Err(UploadRejection::TooLarge { .. })));
    }

    #[test]
    fn test_image_bytes_with_txt_extension_rejected_at_allow_list() {
        let result =
            UploadValidator::default().validate(&upload("photo.txt", png_bytes()), UploadDirectory::Menu);
        assert_eq!(
            result,
            Err(UploadRejection::UnsupportedType {
                extension: "txt".to_string()
            })
        );
    }

    #[test]
    fn test_content_decides_image_check_not_name() {
        // PNG bytes named .jpg still decode; the allow-list accepts jpg.
        assert!(
            UploadValidator::default()
                .validate(&upload("photo.jpg", png_bytes()), UploadDirectory::Menu)
                .is_ok()
        );
    }

    #[test]
    fn test_missing_extension_rejected() {
        let result = UploadValidator::default().validate(&upload("photo", png_bytes()), UploadDirectory::Menu);
        assert!(matches!(result, Err(UploadRejection::UnsupportedType { .. })));
    }

    #[test]
    fn test_client_path_components_stripped() {
        let accepted = UploadValidator::default()
            .validate_at(&upload("../../etc/logo.png", png_bytes()), UploadDirectory::Site, 42)
            .unwrap();
        assert_eq!(accepted.relative_path, "/uploads/site/42_logo.png");

        let accepted = UploadValidator::default()
            .validate_at(&upload(r"C:\Users\me\logo.gif", png_bytes()), UploadDirectory::Site, 42)
            .unwrap();
        assert_eq!(accepted.file_name, "42_logo.gif");
    }
}
