use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of an account in the reseller hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    Admin,
    Reseller,
    User,
}

pub mod account {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountView {
        pub username: String,
        pub role: AccountRole,
        pub balance: i64,
        pub campaign_count: i64,
        pub created_by: Option<String>,
        /// RFC3339 timestamp, including timezone offset.
        pub created_at: DateTime<FixedOffset>,
    }

    /// Request body for provisioning a sub-account.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountNew {
        pub username: String,
        pub password: String,
        pub role: AccountRole,
        /// Starting balance, paid by the caller. Defaults to 0.
        pub balance: Option<i64>,
    }

    /// Request body for granting points to another account.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct CreditNew {
        pub receiver: String,
        pub amount: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CreditGranted {
        pub debit_id: Uuid,
        pub credit_id: Uuid,
        pub grantor_balance: i64,
        pub receiver_balance: i64,
    }
}

pub mod campaign {
    use super::*;

    /// Recipient numbers as submitted by the dashboard.
    ///
    /// Either a single comma-separated string or an already-split list; the
    /// server splits/trims either form before the engine sees it.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum MobileNumbers {
        Raw(String),
        List(Vec<String>),
    }

    /// How the recipients were submitted, echoed back in the response.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum MobileNumberEntryType {
        Text,
        List,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum MediaKind {
        Image,
        Video,
        Pdf,
    }

    /// Descriptor of an uploaded media attachment (the upload transport
    /// itself lives outside this API).
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct MediaDescriptor {
        pub url: String,
        pub filename: String,
        pub size_bytes: i64,
        pub mime_type: String,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct PhoneButtonView {
        pub text: String,
        pub number: String,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct LinkButtonView {
        pub text: String,
        pub url: String,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct MediaView {
        pub kind: MediaKind,
        pub url: String,
        pub filename: String,
        pub size_bytes: i64,
        pub mime_type: String,
    }

    /// Request body for creating (and funding) a campaign.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct CampaignNew {
        pub campaign_name: String,
        pub message: String,
        pub country_code: String,
        pub mobile_numbers: MobileNumbers,
        pub phone_button_text: Option<String>,
        pub phone_button_number: Option<String>,
        pub link_button_text: Option<String>,
        pub link_button_url: Option<String>,
        pub media: Option<MediaDescriptor>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CampaignData {
        pub campaign_id: Uuid,
        pub campaign_name: String,
        pub message: String,
        pub phone_button: Option<PhoneButtonView>,
        pub link_button: Option<LinkButtonView>,
        pub media: Option<MediaView>,
        pub mobile_number_entry_type: MobileNumberEntryType,
        pub requested_number_count: usize,
        pub actual_number_count: usize,
        pub points_deducted: i64,
        pub remaining_balance: i64,
        pub country_code: String,
        /// RFC3339 timestamp, including timezone offset.
        pub created_at: DateTime<FixedOffset>,
        pub transaction_id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CampaignCreated {
        pub success: bool,
        pub message: String,
        pub data: CampaignData,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CampaignList {
        pub limit: Option<u64>,
        /// Opaque pagination cursor (base64), from `next_cursor`.
        ///
        /// Newest → older pagination.
        pub cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CampaignView {
        pub id: Uuid,
        pub name: String,
        pub message: String,
        pub country_code: String,
        pub phone_button: Option<PhoneButtonView>,
        pub link_button: Option<LinkButtonView>,
        pub media: Option<MediaView>,
        pub recipients: Vec<String>,
        pub recipient_count: usize,
        pub created_at: DateTime<FixedOffset>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CampaignListResponse {
        pub campaigns: Vec<CampaignView>,
        pub next_cursor: Option<String>,
    }
}

pub mod journal {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum EntryKind {
        Credit,
        Debit,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum EntryStatus {
        Success,
        Failed,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct JournalList {
        /// Account whose journal to read; defaults to the caller's.
        pub account_id: Option<String>,
        pub limit: Option<u64>,
        /// Opaque pagination cursor (base64), from `next_cursor`.
        ///
        /// Newest → older pagination.
        pub cursor: Option<String>,
        pub from: Option<DateTime<FixedOffset>>,
        pub to: Option<DateTime<FixedOffset>>,
        pub kinds: Option<Vec<EntryKind>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct JournalEntryView {
        pub id: Uuid,
        pub kind: EntryKind,
        pub status: EntryStatus,
        pub amount: i64,
        pub balance_before: i64,
        pub balance_after: i64,
        pub campaign_id: Option<Uuid>,
        pub counterparty: Option<String>,
        /// RFC3339 timestamp, including timezone offset.
        pub created_at: DateTime<FixedOffset>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct JournalListResponse {
        pub entries: Vec<JournalEntryView>,
        pub next_cursor: Option<String>,
    }
}
