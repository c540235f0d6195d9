//! Member documents and the Tantivy schema they are indexed with

use super::{StoreError, StoreResult};
use crate::models::{Member, PinColor, Visibility};
use chrono::{DateTime, TimeZone, Utc};
use std::str::FromStr;
use tantivy::schema::*;
use tantivy::TantivyDocument;
use uuid::Uuid;

/// Resolved field handles for the member schema
#[derive(Debug, Clone, Copy)]
pub struct MemberFields {
    pub id: Field,
    pub user_id: Field,
    pub name: Field,
    pub role: Field,
    pub company: Field,
    pub bio: Field,
    pub role_exact: Field,
    pub company_exact: Field,
    pub pin_color: Field,
    pub visibility: Field,
    pub photo_url: Field,
    pub created_at: Field,
    pub updated_at: Field,
}

impl MemberFields {
    /// Look up every field by name in a member schema
    pub fn resolve(schema: &Schema) -> StoreResult<Self> {
        let field = |name: &str| {
            schema
                .get_field(name)
                .map_err(|e| StoreError::IndexInit(format!("Missing field {}: {}", name, e)))
        };

        Ok(Self {
            id: field("id")?,
            user_id: field("user_id")?,
            name: field("name")?,
            role: field("role")?,
            company: field("company")?,
            bio: field("bio")?,
            role_exact: field("role_exact")?,
            company_exact: field("company_exact")?,
            pin_color: field("pin_color")?,
            visibility: field("visibility")?,
            photo_url: field("photo_url")?,
            created_at: field("created_at")?,
            updated_at: field("updated_at")?,
        })
    }

    /// Tokenized fields searched by the text predicate
    pub fn text_fields(&self) -> [Field; 4] {
        [self.name, self.role, self.company, self.bio]
    }
}

/// Build the search schema for members
pub fn build_member_schema() -> Schema {
    let mut schema_builder = Schema::builder();

    // Identity - stored, indexed as raw strings for delete-by-term
    schema_builder.add_text_field("id", STRING | STORED);
    schema_builder.add_text_field("user_id", STRING | STORED);

    // Searchable text
    schema_builder.add_text_field("name", TEXT | STORED);
    schema_builder.add_text_field("role", TEXT | STORED);
    schema_builder.add_text_field("company", TEXT | STORED);
    schema_builder.add_text_field("bio", TEXT | STORED);

    // Untokenized copies for "value in set" filters
    schema_builder.add_text_field("role_exact", STRING);
    schema_builder.add_text_field("company_exact", STRING);
    schema_builder.add_text_field("pin_color", STRING | STORED);
    schema_builder.add_text_field("visibility", STRING | STORED);

    schema_builder.add_text_field("photo_url", STORED);

    // Timestamps as unix millis
    schema_builder.add_i64_field("created_at", STORED | FAST);
    schema_builder.add_i64_field("updated_at", STORED | FAST);

    schema_builder.build()
}

/// A member in the shape it is indexed in
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDocument {
    pub member: Member,
}

impl From<&Member> for MemberDocument {
    fn from(member: &Member) -> Self {
        Self {
            member: member.clone(),
        }
    }
}

impl MemberDocument {
    pub fn document_id(&self) -> String {
        self.member.id.to_string()
    }

    /// Convert to a Tantivy document
    pub fn to_tantivy_doc(&self, fields: &MemberFields) -> TantivyDocument {
        let member = &self.member;
        let mut doc = TantivyDocument::new();

        doc.add_text(fields.id, member.id.to_string());
        doc.add_text(fields.user_id, member.user_id.to_string());
        doc.add_text(fields.name, &member.name);

        if let Some(role) = &member.role {
            doc.add_text(fields.role, role);
            doc.add_text(fields.role_exact, role);
        }
        if let Some(company) = &member.company {
            doc.add_text(fields.company, company);
            doc.add_text(fields.company_exact, company);
        }
        if let Some(bio) = &member.bio {
            doc.add_text(fields.bio, bio);
        }
        if let Some(photo_url) = &member.photo_url {
            doc.add_text(fields.photo_url, photo_url);
        }

        doc.add_text(fields.pin_color, member.pin_color.to_string());
        doc.add_text(fields.visibility, member.visibility.to_string());
        doc.add_i64(fields.created_at, member.created_at.timestamp_millis());
        doc.add_i64(fields.updated_at, member.updated_at.timestamp_millis());

        doc
    }

    /// Decode a stored Tantivy document back into a member
    pub fn from_tantivy_doc(doc: &TantivyDocument, fields: &MemberFields) -> StoreResult<Self> {
        let text = |field: Field| {
            doc.get_first(field)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };
        let required = |field: Field, name: &str| {
            text(field).ok_or_else(|| StoreError::CorruptRow(format!("missing {}", name)))
        };
        let millis = |field: Field, name: &str| -> StoreResult<DateTime<Utc>> {
            let value = doc
                .get_first(field)
                .and_then(|v| v.as_i64())
                .ok_or_else(|| StoreError::CorruptRow(format!("missing {}", name)))?;
            Utc.timestamp_millis_opt(value)
                .single()
                .ok_or_else(|| StoreError::CorruptRow(format!("invalid {}: {}", name, value)))
        };
        let uuid = |field: Field, name: &str| -> StoreResult<Uuid> {
            let raw = required(field, name)?;
            Uuid::parse_str(&raw).map_err(|e| StoreError::CorruptRow(format!("{}: {}", name, e)))
        };

        let pin_color = PinColor::from_str(&required(fields.pin_color, "pin_color")?)
            .map_err(|e| StoreError::CorruptRow(format!("pin_color: {}", e)))?;
        let visibility = Visibility::from_str(&required(fields.visibility, "visibility")?)
            .map_err(|e| StoreError::CorruptRow(format!("visibility: {}", e)))?;

        Ok(Self {
            member: Member {
                id: uuid(fields.id, "id")?,
                user_id: uuid(fields.user_id, "user_id")?,
                name: required(fields.name, "name")?,
                role: text(fields.role),
                company: text(fields.company),
                bio: text(fields.bio),
                photo_url: text(fields.photo_url),
                pin_color,
                visibility,
                created_at: millis(fields.created_at, "created_at")?,
                updated_at: millis(fields.updated_at, "updated_at")?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_building() {
        let schema = build_member_schema();
        let fields = MemberFields::resolve(&schema).unwrap();
        assert_eq!(fields.text_fields().len(), 4);
        assert!(schema.get_field("company_exact").is_ok());
    }

    #[test]
    fn test_member_survives_indexing_shape() {
        let fields = MemberFields::resolve(&build_member_schema()).unwrap();
        let member = Member::new("Ada Lovelace")
            .with_role("Engineer")
            .with_pin_color(PinColor::Lavender)
            .with_visibility(Visibility::Private);

        let doc = MemberDocument::from(&member).to_tantivy_doc(&fields);
        let decoded = MemberDocument::from_tantivy_doc(&doc, &fields).unwrap();

        assert_eq!(decoded.member.id, member.id);
        assert_eq!(decoded.member.role.as_deref(), Some("Engineer"));
        assert!(decoded.member.company.is_none());
        assert_eq!(decoded.member.pin_color, PinColor::Lavender);
        assert_eq!(
            decoded.member.updated_at.timestamp_millis(),
            member.updated_at.timestamp_millis()
        );
    }
}
