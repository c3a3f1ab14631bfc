//! Serde utilities for glam types.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Serde proxy for Vec2
#[derive(Serialize, Deserialize)]
pub struct Vec2Def {
    pub x: f32,
    pub y: f32,
}

impl From<Vec2> for Vec2Def {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<Vec2Def> for Vec2 {
    fn from(def: Vec2Def) -> Self {
        Vec2::new(def.x, def.y)
    }
}

pub fn serialize_vec2<S>(v: &Vec2, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    Vec2Def::from(*v).serialize(s)
}

pub fn deserialize_vec2<'de, D>(d: D) -> Result<Vec2, D::Error>
where
    D: Deserializer<'de>,
{
    Vec2Def::deserialize(d).map(Vec2::from)
}

/// Serde proxy for IVec2
#[derive(Serialize, Deserialize)]
pub struct IVec2Def {
    pub x: i32,
    pub y: i32,
}

impl From<IVec2> for IVec2Def {
    fn from(v: IVec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<IVec2Def> for IVec2 {
    fn from(def: IVec2Def) -> Self {
        IVec2::new(def.x, def.y)
    }
}

pub fn serialize_ivec2<S>(v: &IVec2, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    IVec2Def::from(*v).serialize(s)
}

pub fn deserialize_ivec2<'de, D>(d: D) -> Result<IVec2, D::Error>
where
    D: Deserializer<'de>,
{
    IVec2Def::deserialize(d).map(IVec2::from)
}
