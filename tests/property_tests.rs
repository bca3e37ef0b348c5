use proptest::prelude::*;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use webpify::{decide, generate_output_path, Config, Decision, MimeType, WebpifyError};

const KNOWN_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/bmp",
    "image/tiff",
];

const SOURCE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "PNG", "gif"];

fn type_set() -> impl Strategy<Value = BTreeSet<MimeType>> {
    prop::sample::subsequence(KNOWN_TYPES, 0..=KNOWN_TYPES.len())
        .prop_map(|types| types.into_iter().map(MimeType::new).collect())
}

proptest! {
    #[test]
    fn skip_always_wins(
        mime in prop::sample::select(KNOWN_TYPES),
        accepted in type_set(),
        skip in type_set(),
    ) {
        let mime = MimeType::new(mime);
        let decision = decide(&mime, &accepted, &skip);

        if skip.contains(&mime) {
            prop_assert_eq!(decision, Decision::Skip);
        } else if accepted.contains(&mime) {
            prop_assert_eq!(decision, Decision::Convert);
        } else {
            prop_assert_eq!(decision, Decision::NotAccepted);
        }
    }

    #[test]
    fn mime_type_normalisation_is_idempotent(raw in "[ \t]{0,2}[a-zA-Z]{1,8}/[a-zA-Z0-9.+-]{1,12}[ \t]{0,2}") {
        let once = MimeType::new(&raw);
        let twice = MimeType::new(once.as_str());
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(once.as_str(), raw.trim().to_ascii_lowercase());
    }

    #[test]
    fn output_path_mirrors_relative_location(
        dirs in prop::collection::vec("[a-z0-9_]{1,8}", 0..4),
        stem in "[a-zA-Z0-9_-]{1,12}",
        ext in prop::sample::select(SOURCE_EXTENSIONS),
    ) {
        let input = Path::new("/input");
        let output = Path::new("/output");
        let relative: PathBuf = dirs.iter().collect();
        let source = input.join(&relative).join(format!("{}.{}", stem, ext));

        let result = generate_output_path(&source, input, output).unwrap();

        prop_assert!(result.starts_with(output));
        prop_assert_eq!(result.extension().and_then(|e| e.to_str()), Some("webp"));
        prop_assert_eq!(
            result.strip_prefix(output).unwrap().with_extension(""),
            relative.join(&stem)
        );
    }

    #[test]
    fn config_quality_validation(quality in 0u8..=255u8) {
        let dir = tempfile::TempDir::new().unwrap();
        let result = Config::new(dir.path(), dir.path(), Some(quality), None, None);

        if quality <= 100 {
            prop_assert_eq!(result.unwrap().quality, quality);
        } else {
            prop_assert!(matches!(result, Err(WebpifyError::InvalidQuality(q)) if q == quality));
        }
    }
}
