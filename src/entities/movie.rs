use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "movie")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    /// ISO-8601 `YYYY-MM-DD`, so lexical order is date order.
    pub release_date: String,
    pub score: f64,
    #[sea_orm(column_type = "Text")]
    pub overview: String,
    pub status: Status,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub budget: Decimal,
    pub revenue: f64,
    pub country_id: i32,
}

#[derive(
    Clone, Copy, Debug, Eq, PartialEq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum Status {
    #[sea_orm(string_value = "Released")]
    #[serde(rename = "Released")]
    Released,
    #[sea_orm(string_value = "Post Production")]
    #[serde(rename = "Post Production")]
    PostProduction,
    #[sea_orm(string_value = "In Production")]
    #[serde(rename = "In Production")]
    InProduction,
    #[sea_orm(string_value = "Planned")]
    #[serde(rename = "Planned")]
    Planned,
    #[sea_orm(string_value = "Rumored")]
    #[serde(rename = "Rumored")]
    Rumored,
    #[sea_orm(string_value = "Canceled")]
    #[serde(rename = "Canceled")]
    Canceled,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::country::Entity",
        from = "Column::CountryId",
        to = "super::country::Column::Id",
        on_delete = "Restrict"
    )]
    Country,
}

impl Related<super::country::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Country.def()
    }
}

impl Related<super::genre::Entity> for Entity {
    fn to() -> RelationDef {
        super::movie_genre::Relation::Genre.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::movie_genre::Relation::Movie.def().rev())
    }
}

impl Related<super::actor::Entity> for Entity {
    fn to() -> RelationDef {
        super::movie_actor::Relation::Actor.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::movie_actor::Relation::Movie.def().rev())
    }
}

impl Related<super::language::Entity> for Entity {
    fn to() -> RelationDef {
        super::movie_language::Relation::Language.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::movie_language::Relation::Movie.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
