use crate::models::{EmailProviderKind, EmailProviderSetting};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "email_provider_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: i64,
    pub provider: EmailProviderKind,
    pub from_email: String,
    pub from_name: String,
    pub reply_to_email: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub api_key: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub api_secret: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<i32>,
    pub smtp_secure: Option<bool>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub config_data: Option<Json>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for EmailProviderSetting {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            tenant_id: model.tenant_id,
            provider: model.provider,
            from_email: model.from_email,
            from_name: model.from_name,
            reply_to_email: model.reply_to_email,
            api_key: model.api_key,
            api_secret: model.api_secret,
            smtp_host: model.smtp_host,
            smtp_port: model.smtp_port,
            smtp_secure: model.smtp_secure,
            config_data: model.config_data,
            is_active: model.is_active,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<EmailProviderSetting> for ActiveModel {
    fn from(s: EmailProviderSetting) -> Self {
        ActiveModel {
            id: Set(s.id),
            tenant_id: Set(s.tenant_id),
            provider: Set(s.provider),
            from_email: Set(s.from_email),
            from_name: Set(s.from_name),
            reply_to_email: Set(s.reply_to_email),
            api_key: Set(s.api_key),
            api_secret: Set(s.api_secret),
            smtp_host: Set(s.smtp_host),
            smtp_port: Set(s.smtp_port),
            smtp_secure: Set(s.smtp_secure),
            config_data: Set(s.config_data),
            is_active: Set(s.is_active),
            created_at: Set(s.created_at.into()),
            updated_at: Set(s.updated_at.into()),
        }
    }
}
