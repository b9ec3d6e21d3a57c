use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "promotions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((6, 2)))")]
    pub discount: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        super::product_promotions::Relation::Products.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::product_promotions::Relation::Promotions.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
