// src/select.rs

//! Version and package selection
//!
//! Pure matching logic plus the interactive retry loops around it. The loops
//! re-prompt without an attempt limit, matching the installer's contract that
//! invalid input is never silently substituted.

use crate::catalog::PackageDescriptor;
use crate::error::{Error, Result};
use crate::platform::HostProfile;
use crate::prompt::Prompter;

/// Resolve a version request against the catalog
///
/// Empty or whitespace input selects the newest entry; anything else must
/// match a catalog entry exactly.
pub fn resolve_version<'a>(versions: &'a [String], input: &str) -> Option<&'a str> {
    let input = input.trim();
    if input.is_empty() {
        versions.first().map(String::as_str)
    } else {
        versions
            .iter()
            .find(|v| v.as_str() == input)
            .map(String::as_str)
    }
}

/// Keep the descriptors eligible for this host, preserving catalog order
pub fn filter_packages(packages: &[PackageDescriptor], host: &HostProfile) -> Vec<PackageDescriptor> {
    packages
        .iter()
        .filter(|pkg| pkg.matches(host))
        .cloned()
        .collect()
}

/// Pick a release version
///
/// A preset (from `--release`) must name a catalog entry; interactively the
/// user is re-prompted until the input resolves.
pub fn choose_version(
    prompter: &mut dyn Prompter,
    versions: &[String],
    preset: Option<&str>,
) -> Result<String> {
    if versions.is_empty() {
        return Err(Error::CatalogUnavailable(
            "the catalog lists no releases".to_string(),
        ));
    }

    if let Some(requested) = preset {
        return match resolve_version(versions, requested) {
            Some(version) => Ok(version.to_string()),
            None => Err(Error::InvalidSelection(format!(
                "release {} is not in the catalog",
                requested
            ))),
        };
    }

    let mut input = prompter.ask(
        "Please select a release version [e.g. 0.13.8], leave empty for the latest:\n",
    )?;
    loop {
        match resolve_version(versions, &input) {
            Some(version) => {
                println!("Using version: {}", version);
                return Ok(version.to_string());
            }
            None => {
                input = prompter.ask("No such release, please retry:\n")?;
            }
        }
    }
}

/// Present a 1-based menu of candidates and return the chosen index
///
/// Out-of-range and non-numeric input re-prompts.
pub fn prompt_package(prompter: &mut dyn Prompter, packages: &[PackageDescriptor]) -> Result<usize> {
    println!("Please select the package matching your system:");
    for (i, pkg) in packages.iter().enumerate() {
        println!("  {}\t{}", i + 1, pkg.name);
    }

    loop {
        let input = prompter.ask("# ")?;
        match input.trim().parse::<usize>() {
            Ok(choice) if choice >= 1 && choice <= packages.len() => return Ok(choice - 1),
            _ => println!("Please enter a number between 1 and {}.", packages.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parse_packages_body;
    use crate::platform::{HostProfile, OsFamily};
    use crate::prompt::ScriptedPrompter;

    fn catalog() -> Vec<String> {
        vec!["0.13.8".to_string(), "0.13.7".to_string()]
    }

    #[test]
    fn test_resolve_empty_input_returns_newest() {
        let versions = catalog();
        assert_eq!(resolve_version(&versions, ""), Some("0.13.8"));
        assert_eq!(resolve_version(&versions, "   "), Some("0.13.8"));
    }

    #[test]
    fn test_resolve_exact_match() {
        let versions = catalog();
        assert_eq!(resolve_version(&versions, "0.13.7"), Some("0.13.7"));
    }

    #[test]
    fn test_resolve_unknown_version_is_none() {
        let versions = catalog();
        assert_eq!(resolve_version(&versions, "0.14.0"), None);
    }

    #[test]
    fn test_resolve_empty_catalog() {
        assert_eq!(resolve_version(&[], ""), None);
    }

    fn sample_packages() -> Vec<PackageDescriptor> {
        parse_packages_body(
            r#"[
                {"name":"bmi2-0/terarkdb-0.13.8-linux.tgz","url":"u1"},
                {"name":"bmi2-1/terarkdb-0.13.8-linux.tgz","url":"u2"},
                {"name":"bmi2-0/terarkdb-0.13.8-darwin.tgz","url":"u3"},
                {"name":"bmi2-1/terarkdb-0.13.8-darwin.tgz","url":"u4"}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_filter_keeps_only_exact_host_matches() {
        let packages = sample_packages();
        let host = HostProfile { os: OsFamily::Linux, bmi: false };

        let filtered = filter_packages(&packages, &host);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].url, "u1");

        // no mismatched platform tag ever appears in the output
        for pkg in &filtered {
            assert_eq!(pkg.platform_tag, host.os.tag());
            assert!(pkg.feature_tag.contains(host.feature_tier()));
        }
    }

    #[test]
    fn test_filter_preserves_catalog_order() {
        let mut packages = sample_packages();
        packages.push(packages[0].clone());
        let host = HostProfile { os: OsFamily::Linux, bmi: false };

        let filtered = filter_packages(&packages, &host);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].url, "u1");
        assert_eq!(filtered[1].url, "u1");
    }

    #[test]
    fn test_filter_can_be_empty() {
        let packages = sample_packages();
        let host = HostProfile { os: OsFamily::Darwin, bmi: true };
        let filtered = filter_packages(&packages, &host);
        assert_eq!(filtered.len(), 1);

        let none = filter_packages(&packages[..1], &host);
        assert!(none.is_empty());
    }

    #[test]
    fn test_choose_version_empty_input_uses_latest() {
        let mut prompter = ScriptedPrompter::new([""]);
        let version = choose_version(&mut prompter, &catalog(), None).unwrap();
        assert_eq!(version, "0.13.8");
    }

    #[test]
    fn test_choose_version_retries_until_valid() {
        let mut prompter = ScriptedPrompter::new(["0.14.0", "garbage", "0.13.7"]);
        let version = choose_version(&mut prompter, &catalog(), None).unwrap();
        assert_eq!(version, "0.13.7");
    }

    #[test]
    fn test_choose_version_preset_must_exist() {
        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());
        let result = choose_version(&mut prompter, &catalog(), Some("0.14.0"));
        assert!(matches!(result, Err(Error::InvalidSelection(_))));

        let version = choose_version(&mut prompter, &catalog(), Some("0.13.7")).unwrap();
        assert_eq!(version, "0.13.7");
    }

    #[test]
    fn test_choose_version_empty_catalog_fails() {
        let mut prompter = ScriptedPrompter::new([""]);
        let result = choose_version(&mut prompter, &[], None);
        assert!(matches!(result, Err(Error::CatalogUnavailable(_))));
    }

    #[test]
    fn test_prompt_package_reprompts_on_bad_input() {
        let packages = sample_packages();
        let mut prompter = ScriptedPrompter::new(["abc", "0", "9", "2"]);
        let index = prompt_package(&mut prompter, &packages).unwrap();
        assert_eq!(index, 1);
    }
}
