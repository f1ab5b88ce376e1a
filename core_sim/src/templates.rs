//! Unit type catalog.
//!
//! Templates are the middle layer of the spawn merge: category defaults,
//! then the named template, then caller overrides, with overrides winning.
//! The standard catalog carries the stock roster; missions may register
//! additional templates before spawning.

use std::collections::HashMap;

use bevy::prelude::*;

use sim_runtime::UnitCategory;

use crate::components::CombatFlags;
use crate::grid::FootprintMask;

/// Weapon stat block attached to combat-capable templates.
#[derive(Debug, Clone)]
pub struct WeaponSpec {
    pub power: f32,
    pub range: f32,
    pub reload_ticks: u32,
    pub flags: CombatFlags,
    pub projectile: &'static str,
}

/// Full stat block for one unit kind.
#[derive(Debug, Clone)]
pub struct UnitTemplate {
    pub name: &'static str,
    pub category: UnitCategory,
    pub hit_points: f32,
    pub armor: f32,
    pub sight: f32,
    pub cost: u32,
    /// Pixel-flavored speed, converted by `speed_adjustment_factor`.
    pub speed: f32,
    pub turn_speed: f32,
    /// Collision/exclusion radius in pixels.
    pub radius_px: f32,
    /// Aircraft shadow offset in pixels.
    pub shadow_px: f32,
    pub weapon: Option<WeaponSpec>,
    pub passable_mask: Option<FootprintMask>,
    pub buildable_mask: Option<FootprintMask>,
    /// Production building: can assemble vehicles/aircraft.
    pub can_construct_units: bool,
    /// Construction yard: can erect new buildings.
    pub can_construct_buildings: bool,
    /// Ticks a construct or raise action takes.
    pub construct_ticks: u32,
    /// Building template this unit turns into on deploy.
    pub deploys_into: Option<&'static str>,
    pub deploy_ticks: u32,
    /// Flight speed for projectile templates.
    pub projectile_speed: f32,
}

impl Default for UnitTemplate {
    fn default() -> Self {
        Self {
            name: "",
            category: UnitCategory::Vehicle,
            hit_points: 100.0,
            armor: 0.0,
            sight: 3.0,
            cost: 0,
            speed: 0.0,
            turn_speed: 2.0,
            radius_px: 10.0,
            shadow_px: 0.0,
            weapon: None,
            passable_mask: None,
            buildable_mask: None,
            can_construct_units: false,
            can_construct_buildings: false,
            construct_ticks: 10,
            deploys_into: None,
            deploy_ticks: 10,
            projectile_speed: 0.0,
        }
    }
}

/// Named template registry.
#[derive(Resource, Debug, Clone)]
pub struct UnitCatalog {
    templates: HashMap<&'static str, UnitTemplate>,
}

impl UnitCatalog {
    pub fn empty() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&UnitTemplate> {
        self.templates.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn register(&mut self, template: UnitTemplate) {
        debug_assert!(!template.name.is_empty(), "template requires a name");
        self.templates.insert(template.name, template);
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// The stock roster.
    pub fn standard() -> Self {
        let mut catalog = Self::empty();

        // Buildings.
        catalog.register(UnitTemplate {
            name: "base",
            category: UnitCategory::Building,
            hit_points: 500.0,
            sight: 3.0,
            cost: 5000,
            passable_mask: Some(FootprintMask::from_rows(&[&[1, 1], &[1, 1]])),
            buildable_mask: Some(FootprintMask::from_rows(&[&[1, 1], &[1, 1]])),
            can_construct_buildings: true,
            construct_ticks: 30,
            ..Default::default()
        });
        catalog.register(UnitTemplate {
            name: "starport",
            category: UnitCategory::Building,
            hit_points: 300.0,
            sight: 3.0,
            cost: 2000,
            passable_mask: Some(FootprintMask::from_rows(&[&[1, 1], &[0, 0], &[0, 0]])),
            buildable_mask: Some(FootprintMask::from_rows(&[&[1, 1], &[1, 1], &[1, 1]])),
            can_construct_units: true,
            construct_ticks: 20,
            ..Default::default()
        });
        catalog.register(UnitTemplate {
            name: "ground-turret",
            category: UnitCategory::Building,
            hit_points: 200.0,
            sight: 5.0,
            cost: 1500,
            passable_mask: Some(FootprintMask::from_rows(&[&[1]])),
            buildable_mask: Some(FootprintMask::from_rows(&[&[1]])),
            weapon: Some(WeaponSpec {
                power: 10.0,
                range: 6.0,
                reload_ticks: 8,
                flags: CombatFlags::ATTACK_LAND,
                projectile: "cannon-ball",
            }),
            ..Default::default()
        });
        catalog.register(UnitTemplate {
            name: "refinery",
            category: UnitCategory::Building,
            hit_points: 300.0,
            sight: 3.0,
            cost: 1600,
            passable_mask: Some(FootprintMask::from_rows(&[&[1, 1], &[1, 1]])),
            buildable_mask: Some(FootprintMask::from_rows(&[&[1, 1], &[1, 1]])),
            ..Default::default()
        });

        // Vehicles.
        catalog.register(UnitTemplate {
            name: "scout-tank",
            category: UnitCategory::Vehicle,
            hit_points: 50.0,
            sight: 4.0,
            cost: 500,
            speed: 20.0,
            turn_speed: 4.0,
            radius_px: 11.0,
            weapon: Some(WeaponSpec {
                power: 5.0,
                range: 5.0,
                reload_ticks: 4,
                flags: CombatFlags::ATTACK_LAND,
                projectile: "bullet",
            }),
            ..Default::default()
        });
        catalog.register(UnitTemplate {
            name: "heavy-tank",
            category: UnitCategory::Vehicle,
            hit_points: 100.0,
            sight: 5.0,
            cost: 1200,
            speed: 15.0,
            turn_speed: 2.0,
            radius_px: 13.0,
            weapon: Some(WeaponSpec {
                power: 10.0,
                range: 4.0,
                reload_ticks: 8,
                flags: CombatFlags::ATTACK_LAND,
                projectile: "cannon-ball",
            }),
            ..Default::default()
        });
        catalog.register(UnitTemplate {
            name: "harvester",
            category: UnitCategory::Vehicle,
            hit_points: 50.0,
            sight: 3.0,
            cost: 1600,
            speed: 10.0,
            turn_speed: 2.0,
            radius_px: 10.0,
            deploys_into: Some("refinery"),
            deploy_ticks: 15,
            ..Default::default()
        });
        catalog.register(UnitTemplate {
            name: "transport",
            category: UnitCategory::Vehicle,
            hit_points: 100.0,
            sight: 3.0,
            cost: 400,
            speed: 15.0,
            turn_speed: 2.0,
            radius_px: 15.0,
            ..Default::default()
        });

        // Aircraft.
        catalog.register(UnitTemplate {
            name: "chopper",
            category: UnitCategory::Aircraft,
            hit_points: 50.0,
            sight: 6.0,
            cost: 900,
            speed: 25.0,
            turn_speed: 4.0,
            radius_px: 18.0,
            shadow_px: 20.0,
            weapon: Some(WeaponSpec {
                power: 10.0,
                range: 5.0,
                reload_ticks: 8,
                flags: CombatFlags::ATTACK_LAND,
                projectile: "heatseeker",
            }),
            ..Default::default()
        });
        catalog.register(UnitTemplate {
            name: "wraith",
            category: UnitCategory::Aircraft,
            hit_points: 50.0,
            sight: 8.0,
            cost: 600,
            speed: 40.0,
            turn_speed: 4.0,
            radius_px: 15.0,
            shadow_px: 40.0,
            weapon: Some(WeaponSpec {
                power: 10.0,
                range: 6.0,
                reload_ticks: 10,
                flags: CombatFlags::ATTACK_AIR,
                projectile: "fireball",
            }),
            ..Default::default()
        });

        // Terrain features.
        catalog.register(UnitTemplate {
            name: "oilfield",
            category: UnitCategory::Terrain,
            hit_points: 300.0,
            sight: 0.0,
            passable_mask: Some(FootprintMask::from_rows(&[&[0, 0], &[0, 0]])),
            buildable_mask: Some(FootprintMask::from_rows(&[&[1, 1], &[1, 1]])),
            ..Default::default()
        });
        catalog.register(UnitTemplate {
            name: "bigrocks",
            category: UnitCategory::Terrain,
            hit_points: 500.0,
            sight: 0.0,
            passable_mask: Some(FootprintMask::from_rows(&[&[1, 1], &[1, 0]])),
            buildable_mask: Some(FootprintMask::from_rows(&[&[1, 1], &[1, 1]])),
            ..Default::default()
        });
        catalog.register(UnitTemplate {
            name: "smallrocks",
            category: UnitCategory::Terrain,
            hit_points: 200.0,
            sight: 0.0,
            passable_mask: Some(FootprintMask::from_rows(&[&[1]])),
            buildable_mask: Some(FootprintMask::from_rows(&[&[1]])),
            ..Default::default()
        });

        // Projectiles.
        catalog.register(UnitTemplate {
            name: "bullet",
            category: UnitCategory::Projectile,
            hit_points: 1.0,
            sight: 0.0,
            projectile_speed: 60.0,
            ..Default::default()
        });
        catalog.register(UnitTemplate {
            name: "cannon-ball",
            category: UnitCategory::Projectile,
            hit_points: 1.0,
            sight: 0.0,
            projectile_speed: 25.0,
            ..Default::default()
        });
        catalog.register(UnitTemplate {
            name: "heatseeker",
            category: UnitCategory::Projectile,
            hit_points: 1.0,
            sight: 0.0,
            projectile_speed: 25.0,
            ..Default::default()
        });
        catalog.register(UnitTemplate {
            name: "fireball",
            category: UnitCategory::Projectile,
            hit_points: 1.0,
            sight: 0.0,
            projectile_speed: 60.0,
            ..Default::default()
        });

        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_covers_all_categories() {
        let catalog = UnitCatalog::standard();
        assert!(catalog.contains("base"));
        assert!(catalog.contains("scout-tank"));
        assert!(catalog.contains("chopper"));
        assert!(catalog.contains("oilfield"));
        assert!(catalog.contains("bullet"));
        assert!(!catalog.contains("mammoth-tank"));
    }

    #[test]
    fn structures_carry_footprints() {
        let catalog = UnitCatalog::standard();
        for name in ["base", "starport", "ground-turret", "oilfield"] {
            let template = catalog.get(name).unwrap();
            assert!(template.passable_mask.is_some(), "{name} missing passable");
            assert!(template.buildable_mask.is_some(), "{name} missing buildable");
        }
        // Starport pad is enterable: passable mask is narrower than buildable.
        let starport = catalog.get("starport").unwrap();
        let passable = starport.passable_mask.as_ref().unwrap();
        assert!(!passable.is_set(0, 1));
        assert!(passable.is_set(0, 0));
    }

    #[test]
    fn harvester_deploys_into_refinery() {
        let catalog = UnitCatalog::standard();
        let harvester = catalog.get("harvester").unwrap();
        let target = harvester.deploys_into.unwrap();
        assert_eq!(
            catalog.get(target).unwrap().category,
            UnitCategory::Building
        );
    }
}
