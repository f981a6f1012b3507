use std::fmt;
use std::str::FromStr;

use sea_orm::entity::prelude::*;
use sea_orm::Iterable;
use serde::{Deserialize, Serialize};

use crate::utils::geo::{GeoPoint, RouteEndpoints};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "on_the_way")]
    OnTheWay,
    #[sea_orm(string_value = "started")]
    Started,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "handover")]
    Handover,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::OnTheWay => "on_the_way",
            BookingStatus::Started => "started",
            BookingStatus::Delivered => "delivered",
            BookingStatus::Handover => "handover",
            BookingStatus::Completed => "completed",
            BookingStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookingStatus::iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown booking status: {s}"))
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "booking")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub customer_id: Uuid,
    pub provider_id: Option<Uuid>,
    pub service_id: i32,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    #[sea_orm(column_type = "Text")]
    pub pickup_address: String,
    pub drop_lat: f64,
    pub drop_lng: f64,
    #[sea_orm(column_type = "Text")]
    pub drop_address: String,
    pub status: BookingStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Unassigned bookings in the pending pool can be claimed by any provider.
    pub fn is_claimable(&self) -> bool {
        self.status == BookingStatus::Pending && self.provider_id.is_none()
    }

    pub fn is_held_by(&self, provider_id: Uuid) -> bool {
        self.provider_id == Some(provider_id)
    }
}

impl RouteEndpoints for Model {
    fn pickup_point(&self) -> GeoPoint {
        GeoPoint::new(self.pickup_lat, self.pickup_lng)
    }

    fn drop_point(&self) -> GeoPoint {
        GeoPoint::new(self.drop_lat, self.drop_lng)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CustomerId",
        to = "super::user::Column::Id"
    )]
    Customer,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ProviderId",
        to = "super::user::Column::Id"
    )]
    Provider,
    #[sea_orm(
        belongs_to = "super::service::Entity",
        from = "Column::ServiceId",
        to = "super::service::Column::Id"
    )]
    Service,
    #[sea_orm(has_many = "super::file::Entity")]
    Files,
}

impl Related<super::service::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Service.def()
    }
}

impl Related<super::file::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Files.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
