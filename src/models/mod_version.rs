use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Classification of a mod version
///
/// Persisted and serialized by symbolic name, never by ordinal, so the
/// mapping stays stable across schema evolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ModType {
    #[serde(rename = "UI")]
    Ui,
    #[serde(rename = "SIM")]
    Sim,
}

/// Bidirectional name table backing both the JSON and the SQL codec
const MOD_TYPE_NAMES: &[(ModType, &str)] = &[(ModType::Ui, "UI"), (ModType::Sim, "SIM")];

/// Unknown symbolic name encountered while decoding a [`ModType`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid mod type")]
pub struct ModTypeDecodeError(pub String);

impl ModType {
    pub fn as_name(&self) -> &'static str {
        match MOD_TYPE_NAMES.iter().find(|(t, _)| t == self) {
            Some((_, name)) => name,
            None => unreachable!("every variant is listed in MOD_TYPE_NAMES"),
        }
    }

    /// Resolve a symbolic name, failing on anything not in the table
    pub fn from_name(name: &str) -> Result<Self, ModTypeDecodeError> {
        MOD_TYPE_NAMES
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(t, _)| *t)
            .ok_or_else(|| ModTypeDecodeError(name.to_string()))
    }
}

impl std::fmt::Display for ModType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_name())
    }
}

// Stored as TEXT; decode validates against the name table so an unknown
// name in the database surfaces as a decode error instead of a bad ordinal.
impl sqlx::Type<sqlx::Postgres> for ModType {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <&str as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <&str as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ModType {
    fn decode(
        value: sqlx::postgres::PgValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let name = <&str as sqlx::Decode<'r, sqlx::Postgres>>::decode(value)?;
        Ok(ModType::from_name(name)?)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for ModType {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.as_name(), buf)
    }
}

/// One published version of a mod, as stored in the `mod_version` table
///
/// Rows are created by the publication pipeline and only touched by
/// moderation flows afterwards; versions are never physically deleted,
/// they are soft-hidden via `hidden`.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ModVersion {
    pub id: i32,
    /// Unique content hash of the uploaded package
    pub uid: String,
    #[sqlx(rename = "type")]
    pub mod_type: ModType,
    pub description: String,
    pub version: i16,
    pub filename: String,
    pub icon: Option<String>,
    pub ranked: bool,
    pub hidden: bool,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    /// Owning mod (many-to-one, join column `mod_id`)
    pub mod_id: i32,
}

impl ModVersion {
    /// Derive the thumbnail URL from the stored icon reference
    ///
    /// Pure function of `icon` and the content base URL; recomputed on
    /// every read, never stored.
    pub fn thumbnail_url(&self, content_base: &str) -> Option<String> {
        self.icon.as_deref().map(|icon| {
            format!(
                "{}/mods_thumbs/{}",
                content_base.trim_end_matches('/'),
                urlencoding::encode(icon)
            )
        })
    }

    /// Derive the download URL from the stored filename
    ///
    /// Pure function of `filename` and the content base URL. Path
    /// separators in the filename are preserved, each segment is encoded.
    pub fn download_url(&self, content_base: &str) -> String {
        let encoded: Vec<String> = self
            .filename
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();

        format!(
            "{}/{}",
            content_base.trim_end_matches('/'),
            encoded.join("/")
        )
    }

    /// Build the network representation, recomputing derived attributes
    pub fn into_resource(self, content_base: &str) -> ModVersionResource {
        let thumbnail_url = self.thumbnail_url(content_base);
        let download_url = self.download_url(content_base);

        ModVersionResource {
            id: self.id,
            uid: self.uid,
            mod_type: self.mod_type,
            description: self.description,
            version: self.version,
            filename: self.filename,
            icon: self.icon,
            ranked: self.ranked,
            hidden: self.hidden,
            create_time: self.create_time,
            update_time: self.update_time,
            mod_id: self.mod_id,
            thumbnail_url,
            download_url,
        }
    }
}

/// Network representation of a mod version (resource type `modVersion`)
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModVersionResource {
    pub id: i32,
    pub uid: String,
    #[serde(rename = "type")]
    pub mod_type: ModType,
    pub description: String,
    pub version: i16,
    pub filename: String,
    pub icon: Option<String>,
    pub ranked: bool,
    pub hidden: bool,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    /// Identifier of the owning mod
    #[serde(rename = "mod")]
    pub mod_id: i32,
    /// Computed at read time from `icon`
    pub thumbnail_url: Option<String>,
    /// Computed at read time from `filename`
    pub download_url: String,
}

/// Summary of an owning mod, returned for `include=mod`
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModSummary {
    pub id: i32,
    pub display_name: String,
    pub author: String,
}

/// Moderation write payload for a mod version
///
/// Only the fields moderation flows may touch; everything absent stays
/// untouched. Computed attributes are rejected before deserialization by
/// the resource registry.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModVersionUpdate {
    pub description: Option<String>,
    pub ranked: Option<bool>,
    pub hidden: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> ModVersion {
        ModVersion {
            id: 7,
            uid: "c9b4f12a".to_string(),
            mod_type: ModType::Ui,
            description: "A test mod".to_string(),
            version: 3,
            filename: "mods/test_mod.v0003.zip".to_string(),
            icon: Some("test_mod.png".to_string()),
            ranked: true,
            hidden: false,
            create_time: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            update_time: Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap(),
            mod_id: 4,
        }
    }

    #[test]
    fn test_mod_type_round_trip_by_name() {
        for (mod_type, name) in MOD_TYPE_NAMES {
            assert_eq!(ModType::from_name(name).unwrap(), *mod_type);
            assert_eq!(mod_type.as_name(), *name);

            let json = serde_json::to_string(mod_type).unwrap();
            assert_eq!(json, format!("\"{}\"", name));
            let back: ModType = serde_json::from_str(&json).unwrap();
            assert_eq!(back, *mod_type);
        }
    }

    #[test]
    fn test_mod_type_unknown_name_fails() {
        let err = ModType::from_name("ORDINAL_0").unwrap_err();
        assert_eq!(err, ModTypeDecodeError("ORDINAL_0".to_string()));

        let json: Result<ModType, _> = serde_json::from_str("\"ui\"");
        assert!(json.is_err());
    }

    #[test]
    fn test_download_url_is_pure() {
        let version = sample();
        let first = version.download_url("https://content.example.com/vault");
        let second = version.download_url("https://content.example.com/vault");
        assert_eq!(first, second);
        assert_eq!(
            first,
            "https://content.example.com/vault/mods/test_mod.v0003.zip"
        );
    }

    #[test]
    fn test_download_url_encodes_segments() {
        let mut version = sample();
        version.filename = "mods/my mod & more.zip".to_string();
        assert_eq!(
            version.download_url("https://content.example.com/vault/"),
            "https://content.example.com/vault/mods/my%20mod%20%26%20more.zip"
        );
    }

    #[test]
    fn test_thumbnail_url_requires_icon() {
        let mut version = sample();
        assert_eq!(
            version.thumbnail_url("https://content.example.com/vault"),
            Some("https://content.example.com/vault/mods_thumbs/test_mod.png".to_string())
        );

        version.icon = None;
        assert_eq!(
            version.thumbnail_url("https://content.example.com/vault"),
            None
        );
    }

    #[test]
    fn test_resource_serializes_camel_case_with_plain_booleans() {
        let resource = sample().into_resource("https://content.example.com/vault");
        let json = serde_json::to_value(&resource).unwrap();

        assert_eq!(json["type"], "UI");
        assert_eq!(json["ranked"], serde_json::json!(true));
        assert_eq!(json["hidden"], serde_json::json!(false));
        assert_eq!(json["mod"], 4);
        assert!(json["createTime"].is_string());
        assert_eq!(
            json["downloadUrl"],
            "https://content.example.com/vault/mods/test_mod.v0003.zip"
        );
        assert_eq!(
            json["thumbnailUrl"],
            "https://content.example.com/vault/mods_thumbs/test_mod.png"
        );
    }

    #[test]
    fn test_resource_recomputes_derived_attributes() {
        let version = sample();
        let a = version.clone().into_resource("https://a.example.com");
        let b = version.into_resource("https://b.example.com");
        assert_ne!(a.download_url, b.download_url);
        assert_eq!(a.uid, b.uid);
    }
}
