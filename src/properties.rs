//! Idempotent upserts into the lifecycle manager's flat property file.
//!
//! Exactly two keys are managed here; everything else in the file is
//! somebody else's configuration and must come out byte-identical.

use anyhow::{Context, Result};
use regex::{NoExpand, Regex};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Key holding the absolute path of the generated image spec.
pub const CUSTOM_IMAGE_SPEC_KEY: &str = "lcm.esx.upgrade.custom.image.spec";

/// Key holding the comma-separated host ids excluded from the upgrade.
pub const SKIP_HOST_IDS_KEY: &str = "esx.upgrade.skip.host.ids";

/// Default location of the lifecycle manager's property file.
pub const DEFAULT_PROPERTIES_FILE: &str =
    "/opt/vmware/vcf/lcm/lcm-app/conf/application-prod.properties";

/// Replace the `key=` line with `key=value`, or append it when absent.
///
/// Matching is anchored at line start in multiline mode, with the key
/// regex-escaped (property keys are full of `.`). Every existing line for
/// the key collapses to the new one; when the key is absent the line is
/// appended to the existing content with no added separator, so the file
/// should end in a newline. The result is written to a temp file in the
/// same directory, given the original file's permissions, and renamed over
/// the target, so no failure path leaves a half-written file behind.
pub fn upsert(path: &Path, key: &str, value: &str) -> Result<()> {
    let result = try_upsert(path, key, value);
    match &result {
        Ok(()) => log::info!("updated {key} in {}", path.display()),
        Err(err) => log::error!("failed to update {key} in {}: {err:#}", path.display()),
    }
    result
}

fn try_upsert(path: &Path, key: &str, value: &str) -> Result<()> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read property file: {}", path.display()))?;

    let line = format!("{key}={value}");
    let pattern = Regex::new(&format!(r"(?m)^{}=.*$", regex::escape(key)))
        .context("Failed to compile property key pattern")?;

    let updated = if pattern.is_match(&content) {
        pattern.replace_all(&content, NoExpand(&line)).into_owned()
    } else {
        let mut appended = content;
        appended.push_str(&line);
        appended
    };

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    tmp.write_all(updated.as_bytes())
        .context("Failed to write updated properties")?;

    let permissions = fs::metadata(path)
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .permissions();
    tmp.as_file()
        .set_permissions(permissions)
        .context("Failed to carry over property file permissions")?;

    tmp.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn properties_file(tmp: &TempDir, content: &str) -> PathBuf {
        let path = tmp.path().join("application-prod.properties");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn replaces_an_existing_key_line() {
        let tmp = TempDir::new().unwrap();
        let path = properties_file(
            &tmp,
            "a.key=1\nlcm.esx.upgrade.custom.image.spec=/old/spec.json\nz.key=2\n",
        );

        upsert(&path, CUSTOM_IMAGE_SPEC_KEY, "/new/spec.json").unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "a.key=1\nlcm.esx.upgrade.custom.image.spec=/new/spec.json\nz.key=2\n"
        );
    }

    #[test]
    fn appends_when_the_key_is_absent() {
        let tmp = TempDir::new().unwrap();
        let path = properties_file(&tmp, "a.key=1\n");

        upsert(&path, SKIP_HOST_IDS_KEY, "h1,h2").unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "a.key=1\nesx.upgrade.skip.host.ids=h1,h2"
        );
    }

    #[test]
    fn append_concatenates_without_a_trailing_newline() {
        // The contract adds no separator of its own.
        let tmp = TempDir::new().unwrap();
        let path = properties_file(&tmp, "a.key=1");

        upsert(&path, SKIP_HOST_IDS_KEY, "h1").unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "a.key=1esx.upgrade.skip.host.ids=h1"
        );
    }

    #[test]
    fn upsert_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let path = properties_file(&tmp, "a.key=1\n");

        upsert(&path, CUSTOM_IMAGE_SPEC_KEY, "/spec.json").unwrap();
        let once = fs::read_to_string(&path).unwrap();
        upsert(&path, CUSTOM_IMAGE_SPEC_KEY, "/spec.json").unwrap();
        let twice = fs::read_to_string(&path).unwrap();

        assert_eq!(once, twice);
        assert_eq!(
            once.matches(CUSTOM_IMAGE_SPEC_KEY).count(),
            1,
            "the key line must never duplicate"
        );
    }

    #[test]
    fn unrelated_lines_keep_content_and_order() {
        let tmp = TempDir::new().unwrap();
        let original = "first=1\nsecond=two words\nesx.upgrade.skip.host.ids=old\nthird=3\n";
        let path = properties_file(&tmp, original);

        upsert(&path, SKIP_HOST_IDS_KEY, "h9").unwrap();

        let updated = fs::read_to_string(&path).unwrap();
        assert_eq!(
            updated,
            "first=1\nsecond=two words\nesx.upgrade.skip.host.ids=h9\nthird=3\n"
        );
    }

    #[test]
    fn key_dots_do_not_match_arbitrary_characters() {
        // "lcmXesx..." must not be mistaken for "lcm.esx..." by the pattern.
        let tmp = TempDir::new().unwrap();
        let lookalike = "lcmXesxXupgradeXcustomXimageXspec=/other\n";
        let path = properties_file(&tmp, lookalike);

        upsert(&path, CUSTOM_IMAGE_SPEC_KEY, "/spec.json").unwrap();

        let updated = fs::read_to_string(&path).unwrap();
        assert!(updated.starts_with(lookalike));
        assert!(updated.ends_with("lcm.esx.upgrade.custom.image.spec=/spec.json"));
    }

    #[test]
    fn match_is_anchored_at_line_start() {
        let tmp = TempDir::new().unwrap();
        let path = properties_file(&tmp, "prefix.esx.upgrade.skip.host.ids=keep\n");

        upsert(&path, SKIP_HOST_IDS_KEY, "h1").unwrap();

        let updated = fs::read_to_string(&path).unwrap();
        assert!(updated.contains("prefix.esx.upgrade.skip.host.ids=keep\n"));
        assert!(updated.ends_with("esx.upgrade.skip.host.ids=h1"));
    }

    #[test]
    fn replacement_value_is_not_regex_expanded() {
        let tmp = TempDir::new().unwrap();
        let path = properties_file(&tmp, "esx.upgrade.skip.host.ids=old\n");

        upsert(&path, SKIP_HOST_IDS_KEY, "host$1,host$2").unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "esx.upgrade.skip.host.ids=host$1,host$2\n"
        );
    }

    #[test]
    fn duplicate_key_lines_collapse_to_one_value() {
        let tmp = TempDir::new().unwrap();
        let path = properties_file(&tmp, "k.a=1\nesx.upgrade.skip.host.ids=x\nesx.upgrade.skip.host.ids=y\n");

        upsert(&path, SKIP_HOST_IDS_KEY, "h1").unwrap();

        let updated = fs::read_to_string(&path).unwrap();
        assert_eq!(updated.matches("esx.upgrade.skip.host.ids=h1").count(), 2);
        assert!(!updated.contains("=x"));
        assert!(!updated.contains("=y"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("missing.properties");
        assert!(upsert(&path, SKIP_HOST_IDS_KEY, "h1").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn permissions_survive_the_rewrite() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let path = properties_file(&tmp, "a.key=1\n");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        upsert(&path, SKIP_HOST_IDS_KEY, "h1").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }
}
