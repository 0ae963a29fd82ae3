//! Whole-document configuration store.
//!
//! The configuration is a single JSON document holding presets and the three
//! city contact maps. Readers take a fresh [`ConfigSnapshot`] per use; nothing
//! is cached, so an edit becomes visible to the next reader. Edits are
//! read-modify-write of the whole document.
//!
//! Edits made through one [`ConfigStore`] are serialized by an async mutex.
//! Separate processes writing the same file are not coordinated.

use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::city::{validate_city, City, CityContact, CityListing};
use crate::error::CoreError;
use crate::preset::{validate_preset, Preset};

/* --------------------------------------------------------------------------
   Snapshot
   -------------------------------------------------------------------------- */

/// Point-in-time view of the configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    #[serde(default)]
    pub city2phone: BTreeMap<String, String>,
    #[serde(default)]
    pub city2email: BTreeMap<String, String>,
    #[serde(default)]
    pub city2vk: BTreeMap<String, String>,
    #[serde(default)]
    pub presets: Vec<Preset>,
    /// Keys this service does not interpret; carried through edits untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ConfigSnapshot {
    /// Look up a preset by name.
    pub fn preset(&self, name: &str) -> Result<&Preset, CoreError> {
        self.presets
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| CoreError::not_found("Preset", name))
    }

    /// Contact details for `city`; unknown or absent cities yield empty values.
    pub fn contact(&self, city: Option<&str>) -> CityContact {
        let Some(city) = city else {
            return CityContact::default();
        };
        let lookup = |map: &BTreeMap<String, String>| map.get(city).cloned().unwrap_or_default();
        CityContact {
            phone: lookup(&self.city2phone),
            email: lookup(&self.city2email),
            vk: lookup(&self.city2vk),
        }
    }

    /// Every city named in any of the three maps, sorted by name.
    pub fn cities(&self) -> Vec<CityListing> {
        let names: BTreeSet<&String> = self
            .city2phone
            .keys()
            .chain(self.city2email.keys())
            .chain(self.city2vk.keys())
            .collect();

        names
            .into_iter()
            .map(|name| CityListing {
                name: name.clone(),
                phone: self.city2phone.get(name).cloned(),
                email: self.city2email.get(name).cloned(),
                vk: self.city2vk.get(name).cloned(),
            })
            .collect()
    }

    fn has_city(&self, name: &str) -> bool {
        self.city2phone.contains_key(name)
            || self.city2email.contains_key(name)
            || self.city2vk.contains_key(name)
    }

    fn set_city(&mut self, city: City) {
        self.city2phone.insert(city.name.clone(), city.phone);
        self.city2email.insert(city.name.clone(), city.email);
        self.city2vk.insert(city.name, city.vk);
    }

    // --- Preset edits ---

    pub fn add_preset(&mut self, preset: Preset) -> Result<(), CoreError> {
        validate_preset(&preset)?;
        if self.presets.iter().any(|p| p.name == preset.name) {
            return Err(CoreError::Conflict("Preset already exists".to_string()));
        }
        self.presets.push(preset);
        Ok(())
    }

    /// Replace the preset called `name`. Renaming is not supported.
    pub fn update_preset(&mut self, name: &str, preset: Preset) -> Result<(), CoreError> {
        if preset.name != name {
            return Err(CoreError::Validation(
                "Renaming is not supported. Delete and add again.".to_string(),
            ));
        }
        validate_preset(&preset)?;
        let slot = self
            .presets
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| CoreError::not_found("Preset", name))?;
        *slot = preset;
        Ok(())
    }

    pub fn delete_preset(&mut self, name: &str) -> Result<(), CoreError> {
        let before = self.presets.len();
        self.presets.retain(|p| p.name != name);
        if self.presets.len() == before {
            return Err(CoreError::not_found("Preset", name));
        }
        Ok(())
    }

    // --- City edits ---

    pub fn add_city(&mut self, city: City) -> Result<(), CoreError> {
        validate_city(&city)?;
        if self.has_city(&city.name) {
            return Err(CoreError::Conflict("City already exists".to_string()));
        }
        self.set_city(city);
        Ok(())
    }

    /// Replace the contacts of `name`, which must exist in all three maps.
    pub fn update_city(&mut self, name: &str, city: City) -> Result<(), CoreError> {
        if city.name != name {
            return Err(CoreError::Validation(
                "Renaming is not supported. Delete and add again.".to_string(),
            ));
        }
        validate_city(&city)?;
        let complete = self.city2phone.contains_key(name)
            && self.city2email.contains_key(name)
            && self.city2vk.contains_key(name);
        if !complete {
            return Err(CoreError::not_found("City", name));
        }
        self.set_city(city);
        Ok(())
    }

    /// Remove `name` from every map it appears in.
    pub fn delete_city(&mut self, name: &str) -> Result<(), CoreError> {
        let removed = [
            self.city2phone.remove(name).is_some(),
            self.city2email.remove(name).is_some(),
            self.city2vk.remove(name).is_some(),
        ];
        if removed.iter().any(|r| *r) {
            Ok(())
        } else {
            Err(CoreError::not_found("City", name))
        }
    }
}

/* --------------------------------------------------------------------------
   Store
   -------------------------------------------------------------------------- */

/// JSON-file backed configuration store.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the document as it is on disk right now.
    pub async fn snapshot(&self) -> Result<ConfigSnapshot, CoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(CoreError::Io("Config file not found".to_string()));
            }
            Err(e) => return Err(CoreError::Io(format!("Failed to read config: {e}"))),
        };
        serde_json::from_slice(&bytes)
            .map_err(|e| CoreError::Io(format!("Invalid config.json: {e}")))
    }

    /// Raw document, for callers that want the untyped view.
    pub async fn raw(&self) -> Result<serde_json::Value, CoreError> {
        let snapshot = self.snapshot().await?;
        serde_json::to_value(snapshot).map_err(|e| CoreError::Internal(e.to_string()))
    }

    /// Overwrite the whole document.
    ///
    /// The new content is written to a sibling temp file and renamed over the
    /// existing file, so concurrent readers see either the old or the new document.
    pub async fn replace(&self, snapshot: &ConfigSnapshot) -> Result<(), CoreError> {
        let _guard = self.write_lock.lock().await;
        self.write(snapshot).await
    }

    /// Apply `edit` to the current document and persist the result.
    ///
    /// Nothing is written if `edit` fails.
    pub async fn edit<F>(&self, edit: F) -> Result<(), CoreError>
    where
        F: FnOnce(&mut ConfigSnapshot) -> Result<(), CoreError>,
    {
        let _guard = self.write_lock.lock().await;
        let mut snapshot = self.snapshot().await?;
        edit(&mut snapshot)?;
        self.write(&snapshot).await
    }

    async fn write(&self, snapshot: &ConfigSnapshot) -> Result<(), CoreError> {
        let bytes = to_pretty_json(snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| CoreError::Io(format!("Failed to save config: {e}")))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| CoreError::Io(format!("Failed to save config: {e}")))?;
        tracing::debug!(path = %self.path.display(), presets = snapshot.presets.len(), "Config saved");
        Ok(())
    }
}

/// Four-space indented JSON, non-ASCII left unescaped.
fn to_pretty_json(snapshot: &ConfigSnapshot) -> Result<Vec<u8>, CoreError> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    snapshot
        .serialize(&mut ser)
        .map_err(|e| CoreError::Internal(format!("Failed to serialize config: {e}")))?;
    Ok(out)
}

/* --------------------------------------------------------------------------
   Tests
   -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::{TextItem, TextKind};
    use assert_matches::assert_matches;

    const DOC: &str = r##"{
        "city2phone": {"Kazan": "+7 843", "Omsk": "+7 381"},
        "city2email": {"Kazan": "kazan@example.com"},
        "city2vk": {"Kazan": "vk.com/kazan"},
        "presets": [{
            "name": "wedding",
            "template": "wedding.png",
            "texts": [
                {"type": "date", "x": 10, "y": 10, "font": "Arial.ttf", "size": 24, "color": "#000"},
                {"type": "time", "x": 10, "y": 40, "font": "Arial.ttf", "size": 24, "color": "#000"},
                {"type": "address", "x": 10, "y": 70, "font": "Arial.ttf", "size": 18, "color": "#333333"}
            ]
        }],
        "ui": {"theme": "dark"}
    }"##;

    fn preset(name: &str) -> Preset {
        Preset {
            name: name.to_string(),
            template: "t.png".to_string(),
            texts: TextKind::ALL
                .iter()
                .map(|&kind| TextItem {
                    kind,
                    x: 0,
                    y: 0,
                    font: "f.ttf".to_string(),
                    size: 12,
                    color: "#fff".to_string(),
                })
                .collect(),
        }
    }

    fn city(name: &str) -> City {
        City {
            name: name.into(),
            phone: "1".into(),
            email: "c@example.com".into(),
            vk: "vk".into(),
        }
    }

    fn snapshot() -> ConfigSnapshot {
        serde_json::from_str(DOC).unwrap()
    }

    // --- Snapshot queries ---

    #[test]
    fn preset_lookup() {
        let snap = snapshot();
        assert_eq!(snap.preset("wedding").unwrap().texts.len(), 3);
        let err = snap.preset("nonexistent").unwrap_err();
        assert!(err.to_string().starts_with("Preset not found"), "{err}");
    }

    #[test]
    fn contact_degrades_to_empty() {
        let snap = snapshot();
        let kazan = snap.contact(Some("Kazan"));
        assert_eq!(kazan.phone, "+7 843");
        assert_eq!(kazan.vk, "vk.com/kazan");

        let omsk = snap.contact(Some("Omsk"));
        assert_eq!(omsk.phone, "+7 381");
        assert_eq!(omsk.email, "");

        assert_eq!(snap.contact(Some("Nowhere")), CityContact::default());
        assert_eq!(snap.contact(None), CityContact::default());
    }

    #[test]
    fn cities_are_a_sorted_union() {
        let listing = snapshot().cities();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].name, "Kazan");
        assert_eq!(listing[1].name, "Omsk");
        assert_eq!(listing[1].email, None);
    }

    #[test]
    fn missing_top_level_keys_default_to_empty() {
        let snap: ConfigSnapshot = serde_json::from_str("{}").unwrap();
        assert!(snap.presets.is_empty());
        assert!(snap.city2phone.is_empty());
    }

    // --- Edits ---

    #[test]
    fn preset_edits() {
        let mut snap = snapshot();
        assert_matches!(snap.add_preset(preset("wedding")), Err(CoreError::Conflict(_)));
        snap.add_preset(preset("birthday")).unwrap();
        assert_eq!(snap.presets.len(), 2);

        let mut invalid = preset("party");
        invalid.texts.pop();
        assert_matches!(snap.add_preset(invalid), Err(CoreError::Validation(_)));

        assert_matches!(
            snap.update_preset("birthday", preset("other")),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            snap.update_preset("ghost", preset("ghost")),
            Err(CoreError::NotFound { .. })
        );
        let mut updated = preset("birthday");
        updated.template = "new.png".into();
        snap.update_preset("birthday", updated).unwrap();
        assert_eq!(snap.preset("birthday").unwrap().template, "new.png");

        snap.delete_preset("birthday").unwrap();
        assert_matches!(snap.delete_preset("birthday"), Err(CoreError::NotFound { .. }));
    }

    #[test]
    fn city_edits() {
        let mut snap = snapshot();
        assert_matches!(snap.add_city(city("Omsk")), Err(CoreError::Conflict(_)));
        snap.add_city(city("Perm")).unwrap();
        assert_eq!(snap.contact(Some("Perm")).email, "c@example.com");

        // Omsk is only in one map, so it cannot be updated.
        assert_matches!(snap.update_city("Omsk", city("Omsk")), Err(CoreError::NotFound { .. }));
        assert_matches!(snap.update_city("Perm", city("Kazan")), Err(CoreError::Validation(_)));
        snap.update_city("Kazan", city("Kazan")).unwrap();
        assert_eq!(snap.contact(Some("Kazan")).phone, "1");

        snap.delete_city("Omsk").unwrap();
        assert_matches!(snap.delete_city("Omsk"), Err(CoreError::NotFound { .. }));
    }

    // --- Store ---

    #[tokio::test]
    async fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("config.json"));
        let err = store.snapshot().await.unwrap_err();
        assert_eq!(err.to_string(), "I/O error: Config file not found");
    }

    #[tokio::test]
    async fn malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = ConfigStore::new(&path).snapshot().await.unwrap_err();
        assert!(err.to_string().contains("Invalid config.json"), "{err}");
    }

    #[tokio::test]
    async fn edit_round_trips_and_keeps_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, DOC).unwrap();
        let store = ConfigStore::new(&path);

        store.edit(|snap| snap.add_preset(preset("birthday"))).await.unwrap();

        let reread = store.snapshot().await.unwrap();
        assert_eq!(reread.presets.len(), 2);
        assert_eq!(reread.extra["ui"]["theme"], "dark");

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n    \"city2email\""), "4-space indent expected:\n{text}");
        assert!(!dir.path().join("config.json.tmp").exists());
    }

    #[tokio::test]
    async fn failed_edit_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, DOC).unwrap();
        let store = ConfigStore::new(&path);

        let result = store.edit(|snap| snap.delete_preset("ghost")).await;
        assert_matches!(result, Err(CoreError::NotFound { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DOC);
    }

    #[tokio::test]
    async fn non_ascii_is_written_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = ConfigStore::new(&path);

        let mut snap = ConfigSnapshot::default();
        snap.add_city(city("Казань")).unwrap();
        store.replace(&snap).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Казань"));
        assert_eq!(store.snapshot().await.unwrap(), snap);
    }
}
