//! Aggregate feed assembly
//!
//! Concatenates the per-repository addon manifests into one installable feed
//! document with a single XML prolog, and fingerprints the result so clients
//! can poll for changes cheaply.

use std::collections::BTreeMap;

use md5::{Digest, Md5};

use crate::catalog::types::{Feed, RepoDetail};

const FEED_PROLOG: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Builds the feed document from the resolved details.
///
/// Details are embedded in key order, so the document is deterministic for a
/// given set of inputs. Details without a manifest are skipped. Each
/// fragment's own prolog line is dropped; the document keeps exactly one.
pub fn build_feed(details: &BTreeMap<String, RepoDetail>) -> Feed {
    let mut document = format!("{FEED_PROLOG}\n<addons>\n");
    for detail in details.values() {
        let Some(manifest) = &detail.manifest else {
            continue;
        };
        document.push_str(strip_prolog(manifest.trim_end()));
        document.push_str("\n\n");
    }

    let document = format!("{}\n</addons>\n", document.trim_end());
    let digest = Md5::digest(document.as_bytes()).to_vec();
    Feed { document, digest }
}

/// Drops a leading prolog line, keeping the newline that followed it.
fn strip_prolog(fragment: &str) -> &str {
    if !fragment.starts_with("<?xml") {
        return fragment;
    }
    match fragment.find('\n') {
        Some(index) => &fragment[index..],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::RepoInfo;

    const BARE_DOCUMENT: &str =
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<addons>\n</addons>\n";

    fn detail(name: &str, manifest: Option<&str>) -> (String, RepoDetail) {
        let mut detail = RepoDetail::new(RepoInfo {
            name: name.to_string(),
            ..RepoInfo::default()
        });
        detail.manifest = manifest.map(String::from);
        (name.to_string(), detail)
    }

    #[test]
    fn no_details_produce_a_bare_document() {
        let feed = build_feed(&BTreeMap::new());

        assert_eq!(feed.document, BARE_DOCUMENT);
    }

    #[test]
    fn fragments_are_merged_under_a_single_prolog() {
        let details = BTreeMap::from([
            detail(
                "plugin.video.one",
                Some("<?xml version=\"1.0\"?>\n<addon id=\"plugin.video.one\"/>\n"),
            ),
            detail(
                "plugin.video.two",
                Some("<?xml version=\"1.0\"?>\n<addon id=\"plugin.video.two\"/>\n"),
            ),
        ]);

        let feed = build_feed(&details);

        assert_eq!(feed.document.matches("<?xml").count(), 1);
        assert!(feed.document.starts_with(FEED_PROLOG));
        assert!(feed.document.contains("<addon id=\"plugin.video.one\"/>"));
        assert!(feed.document.contains("<addon id=\"plugin.video.two\"/>"));
        assert!(feed.document.ends_with("\n</addons>\n"));
    }

    #[test]
    fn details_without_a_manifest_are_skipped() {
        let details = BTreeMap::from([
            detail("plugin.video.one", Some("<addon id=\"plugin.video.one\"/>")),
            detail("plugin.video.two", None),
        ]);

        let feed = build_feed(&details);

        assert!(feed.document.contains("plugin.video.one"));
        assert!(!feed.document.contains("plugin.video.two"));
    }

    #[test]
    fn manifests_without_a_prolog_are_embedded_verbatim() {
        let details = BTreeMap::from([detail(
            "plugin.video.one",
            Some("<addon id=\"plugin.video.one\"/>"),
        )]);

        let feed = build_feed(&details);

        assert!(feed.document.contains("<addon id=\"plugin.video.one\"/>"));
        assert_eq!(feed.document.matches("<?xml").count(), 1);
    }

    #[test]
    fn prolog_only_manifests_contribute_nothing() {
        let details = BTreeMap::from([detail(
            "plugin.video.one",
            Some("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"),
        )]);

        let feed = build_feed(&details);

        assert_eq!(feed.document, BARE_DOCUMENT);
    }

    #[test]
    fn digest_tracks_the_document() {
        let one = build_feed(&BTreeMap::from([detail(
            "plugin.video.one",
            Some("<addon id=\"plugin.video.one\"/>"),
        )]));
        let two = build_feed(&BTreeMap::from([detail(
            "plugin.video.two",
            Some("<addon id=\"plugin.video.two\"/>"),
        )]));

        assert_eq!(one.digest, Md5::digest(one.document.as_bytes()).to_vec());
        assert_eq!(one.digest_hex().len(), 32);
        assert_ne!(one.digest, two.digest);
    }
}
