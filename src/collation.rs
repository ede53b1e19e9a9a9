/*! Identifier collation

Tables sorted by utterance identifier must be sorted the way the downstream toolkit checks
them. Kaldi recipes run under `LC_ALL=C`, hence [Collation::Bytes] is the default.
A single collation is used for every table of a data directory.

[Collation::from_env] looks the locale up like the C library does: `LC_ALL`, then
`LC_COLLATE`, then `LANG`.
!*/
use std::cmp::Ordering;

use icu::collator::{Collator, CollatorOptions};
use icu::locid::Locale;
use log::{debug, warn};

pub enum Collation {
    /// Byte-wise comparison (`C`/`POSIX` locale).
    Bytes,
    /// ICU collation for a named locale.
    Locale { name: String, collator: Collator },
}

impl Collation {
    /// Collation of the locale set in the process environment.
    pub fn from_env() -> Self {
        let name = ["LC_ALL", "LC_COLLATE", "LANG"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.is_empty());

        match name {
            Some(name) => Self::from_locale_name(&name),
            None => Collation::Bytes,
        }
    }

    /// Collation for a POSIX locale name such as `en_US.UTF-8` or `C`.
    ///
    /// Unknown locales fall back to byte order.
    pub fn from_locale_name(name: &str) -> Self {
        let tag = match posix_to_bcp47(name) {
            Some(tag) => tag,
            None => {
                debug!("locale {:?}: byte order collation", name);
                return Collation::Bytes;
            }
        };

        let locale: Locale = match tag.parse() {
            Ok(locale) => locale,
            Err(e) => {
                warn!("unparsable locale {:?} ({:?}), using byte order", name, e);
                return Collation::Bytes;
            }
        };

        match Collator::try_new(&locale.into(), CollatorOptions::new()) {
            Ok(collator) => {
                debug!("locale {:?}: ICU collation for {}", name, tag);
                Collation::Locale {
                    name: tag,
                    collator,
                }
            }
            Err(e) => {
                warn!("no collation data for {:?} ({:?}), using byte order", name, e);
                Collation::Bytes
            }
        }
    }

    pub fn is_bytes(&self) -> bool {
        matches!(self, Collation::Bytes)
    }

    /// Compare two identifiers.
    ///
    /// Identifiers the locale considers equal are ordered by bytes, so the result is a total order.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match self {
            Collation::Bytes => a.cmp(b),
            Collation::Locale { collator, .. } => collator.compare(a, b).then_with(|| a.cmp(b)),
        }
    }

    /// Sort `items` by the identifier returned by `key`.
    pub fn sort_by_key<T, F>(&self, items: &mut [T], key: F)
    where
        F: Fn(&T) -> &str,
    {
        items.sort_unstable_by(|a, b| self.compare(key(a), key(b)));
    }
}

impl std::fmt::Debug for Collation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Collation::Bytes => write!(f, "Bytes"),
            Collation::Locale { name, .. } => write!(f, "Locale({})", name),
        }
    }
}

/// `en_US.UTF-8@euro` -> `en-US`. Returns [None] for the `C`/`POSIX` locales.
fn posix_to_bcp47(name: &str) -> Option<String> {
    let base = name
        .split(['.', '@'])
        .next()
        .unwrap_or_default();

    match base {
        "" | "C" | "POSIX" => None,
        base => Some(base.replace('_', "-")),
    }
}
