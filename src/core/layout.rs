/// Procedural architecture layout — wall segments and pillars from
/// builder-supplied waypoint polylines.
///
/// Pure, stateless mappings: waypoints in, objects out. Wall ends are
/// square-cut; no junction mitering.

use glam::{Vec2, Vec3};

use crate::schema::scene::{
    Color, Geometry, Material, ObjectDefinition, StandardMaterial,
};

#[derive(Debug, Clone)]
pub struct WallConfig {
    pub height: f32,
    pub thickness: f32,
    pub material: Material,
    pub name_prefix: String,
}

impl Default for WallConfig {
    fn default() -> Self {
        WallConfig {
            height: 4.0,
            thickness: 0.5,
            material: Material::Standard(StandardMaterial {
                color: Color(0x808080),
                roughness: 0.9,
                metalness: 0.1,
                ..StandardMaterial::default()
            }),
            name_prefix: "wall".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PillarConfig {
    pub radius: f32,
    pub height: f32,
    pub radial_segments: u32,
    pub material: Material,
    pub name_prefix: String,
}

impl Default for PillarConfig {
    fn default() -> Self {
        PillarConfig {
            radius: 0.4,
            height: 4.0,
            radial_segments: 8,
            material: Material::Standard(StandardMaterial {
                color: Color(0x808080),
                roughness: 0.7,
                metalness: 0.2,
                ..StandardMaterial::default()
            }),
            name_prefix: "pillar".to_string(),
        }
    }
}

/// One box segment per consecutive waypoint pair: sized to the pair's
/// distance, yawed by its angle, centered on its midpoint.
///
/// `first_index` offsets the generated names so several polylines can
/// share a prefix without colliding.
pub fn wall_segments(
    waypoints: &[Vec2],
    first_index: usize,
    config: &WallConfig,
) -> Vec<ObjectDefinition> {
    waypoints
        .windows(2)
        .enumerate()
        .map(|(i, pair)| {
            let (start, end) = (pair[0], pair[1]);
            let length = start.distance(end);
            let angle = (end.y - start.y).atan2(end.x - start.x);
            let center = (start + end) / 2.0;

            let mut obj = ObjectDefinition::named(format!(
                "{}_{}",
                config.name_prefix,
                first_index + i
            ));
            obj.geometry = Some(Geometry::Box {
                parameters: vec![length, config.height, config.thickness],
            });
            obj.material = Some(config.material.clone());
            obj.position = Vec3::new(center.x, config.height / 2.0, center.y);
            obj.rotation = Vec3::new(0.0, angle, 0.0);
            obj.cast_shadows = true;
            obj.receive_shadows = true;
            obj
        })
        .collect()
}

/// One cylinder per waypoint, independent of ordering.
pub fn pillars(
    waypoints: &[Vec2],
    first_index: usize,
    config: &PillarConfig,
) -> Vec<ObjectDefinition> {
    waypoints
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let mut obj = ObjectDefinition::named(format!(
                "{}_{}",
                config.name_prefix,
                first_index + i
            ));
            obj.geometry = Some(Geometry::Cylinder {
                parameters: vec![
                    config.radius,
                    config.radius,
                    config.height,
                    config.radial_segments as f32,
                ],
            });
            obj.material = Some(config.material.clone());
            obj.position = Vec3::new(p.x, config.height / 2.0, p.y);
            obj.cast_shadows = true;
            obj.receive_shadows = true;
            obj
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec2;
    use std::f32::consts::FRAC_PI_4;

    #[test]
    fn n_waypoints_emit_n_minus_one_segments() {
        let waypoints = vec![
            vec2(0.0, 0.0),
            vec2(10.0, 0.0),
            vec2(10.0, 10.0),
            vec2(0.0, 10.0),
        ];
        let walls = wall_segments(&waypoints, 0, &WallConfig::default());
        assert_eq!(walls.len(), 3);
    }

    #[test]
    fn n_waypoints_emit_n_pillars() {
        let waypoints = vec![vec2(5.0, 5.0), vec2(15.0, 5.0)];
        let p = pillars(&waypoints, 0, &PillarConfig::default());
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn fewer_than_two_waypoints_emit_no_segments() {
        assert!(wall_segments(&[], 0, &WallConfig::default()).is_empty());
        assert!(wall_segments(&[vec2(1.0, 1.0)], 0, &WallConfig::default()).is_empty());
    }

    #[test]
    fn segment_sized_and_centered_on_its_pair() {
        let walls = wall_segments(
            &[vec2(0.0, 0.0), vec2(10.0, 0.0)],
            0,
            &WallConfig::default(),
        );
        let wall = &walls[0];
        assert_eq!(wall.name, "wall_0");
        assert!(matches!(
            wall.geometry,
            Some(Geometry::Box { ref parameters })
                if (parameters[0] - 10.0).abs() < 1e-5 && parameters[1] == 4.0
        ));
        assert_eq!(wall.position, Vec3::new(5.0, 2.0, 0.0));
        assert_eq!(wall.rotation.y, 0.0);
    }

    #[test]
    fn segment_yawed_by_pair_angle() {
        let walls = wall_segments(
            &[vec2(0.0, 0.0), vec2(4.0, 4.0)],
            0,
            &WallConfig::default(),
        );
        assert!((walls[0].rotation.y - FRAC_PI_4).abs() < 1e-5);
        let expected_len = (32.0f32).sqrt();
        assert!(matches!(
            walls[0].geometry,
            Some(Geometry::Box { ref parameters })
                if (parameters[0] - expected_len).abs() < 1e-4
        ));
    }

    #[test]
    fn first_index_offsets_names() {
        let walls = wall_segments(
            &[vec2(0.0, 0.0), vec2(1.0, 0.0), vec2(2.0, 0.0)],
            5,
            &WallConfig::default(),
        );
        assert_eq!(walls[0].name, "wall_5");
        assert_eq!(walls[1].name, "wall_6");

        let p = pillars(&[vec2(0.0, 0.0)], 3, &PillarConfig::default());
        assert_eq!(p[0].name, "pillar_3");
    }

    #[test]
    fn pillar_stands_on_its_waypoint() {
        let p = pillars(&[vec2(5.0, 8.0)], 0, &PillarConfig::default());
        assert_eq!(p[0].position, Vec3::new(5.0, 2.0, 8.0));
        assert!(matches!(
            p[0].geometry,
            Some(Geometry::Cylinder { ref parameters }) if parameters.len() == 4
        ));
    }
}
