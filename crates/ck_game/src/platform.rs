//! Static platform rectangles and the swept landing test run against them.
//!
//! Platforms are one-way: the character only collides with a platform's top
//! surface, and only when its collision-bottom crossed that surface during the
//! last vertical step. Horizontal travel never collides, so the character can
//! walk through platforms from the side and jump up through them from below.

use ck_core::geometry::Rect;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformKind {
    /// Collidable but never drawn.
    Invisible,
    /// Drawn with the named visual variant (tile set, color, ...).
    Visible(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Platform {
    pub rect: Rect,
    pub kind: PlatformKind,
}

impl Platform {
    pub fn visible(rect: Rect, variant: &str) -> Self {
        Self {
            rect,
            kind: PlatformKind::Visible(variant.to_string()),
        }
    }

    pub fn invisible(rect: Rect) -> Self {
        Self {
            rect,
            kind: PlatformKind::Invisible,
        }
    }

    pub fn top(&self) -> f32 {
        self.rect.y
    }
}

/// Ordered platform list of the active level. Iteration order is the
/// tie-breaker when several platforms match the same landing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlatformSet {
    platforms: Vec<Platform>,
}

impl PlatformSet {
    pub fn new(platforms: Vec<Platform>) -> Self {
        Self { platforms }
    }

    pub fn all(&self) -> &[Platform] {
        &self.platforms
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }
}

/// The part of the character that takes part in the landing test.
#[derive(Debug, Clone, Copy)]
pub struct LandingProbe {
    /// Horizontal collision box, already inset from the drawn sprite.
    pub left: f32,
    pub right: f32,
    /// Collision-bottom after this tick's vertical step.
    pub bottom: f32,
    /// Vertical step that was just applied.
    pub velocity_y: f32,
}

impl LandingProbe {
    pub fn previous_bottom(&self) -> f32 {
        self.bottom - self.velocity_y
    }
}

/// First platform (in list order) whose top surface the probe's bottom edge
/// crossed or touched during the last step.
pub fn find_landing<'a>(platforms: &'a PlatformSet, probe: &LandingProbe) -> Option<&'a Platform> {
    let previous = probe.previous_bottom();
    platforms.all().iter().find(|p| {
        previous <= p.top() && probe.bottom >= p.top() && p.rect.overlaps_x(probe.left, probe.right)
    })
}

/// Character `y` that puts its collision-bottom exactly on `surface_y`.
pub fn snap_to_surface(surface_y: f32, height: f32, collision_y_offset: f32) -> f32 {
    surface_y - height - collision_y_offset
}

/// True when the character's top edge sits inside a platform's vertical span
/// while overlapping it horizontally, i.e. it is pressed against the underside.
pub fn touching_from_below(platforms: &PlatformSet, left: f32, right: f32, top: f32) -> bool {
    platforms
        .all()
        .iter()
        .any(|p| p.rect.overlaps_x(left, right) && p.rect.contains_y(top))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(left: f32, bottom: f32, velocity_y: f32) -> LandingProbe {
        LandingProbe {
            left,
            right: left + 32.0,
            bottom,
            velocity_y,
        }
    }

    #[test]
    fn crossing_the_surface_is_a_landing() {
        let set = PlatformSet::new(vec![Platform::visible(
            Rect::new(0.0, 300.0, 100.0, 16.0),
            "grass",
        )]);
        // Bottom moved 295 -> 305 this step.
        assert!(find_landing(&set, &probe(10.0, 305.0, 10.0)).is_some());
    }

    #[test]
    fn resting_exactly_on_surface_counts() {
        let set = PlatformSet::new(vec![Platform::invisible(Rect::new(0.0, 300.0, 100.0, 16.0))]);
        assert!(find_landing(&set, &probe(10.0, 300.0, 0.0)).is_some());
    }

    #[test]
    fn already_below_surface_is_not_a_landing() {
        let set = PlatformSet::new(vec![Platform::invisible(Rect::new(0.0, 300.0, 100.0, 16.0))]);
        // Bottom moved 302 -> 310: was never above the surface.
        assert!(find_landing(&set, &probe(10.0, 310.0, 8.0)).is_none());
    }

    #[test]
    fn moving_up_through_platform_is_not_a_landing() {
        let set = PlatformSet::new(vec![Platform::invisible(Rect::new(0.0, 300.0, 100.0, 16.0))]);
        assert!(find_landing(&set, &probe(10.0, 298.0, -6.0)).is_none());
    }

    #[test]
    fn no_horizontal_overlap_no_landing() {
        let set = PlatformSet::new(vec![Platform::invisible(Rect::new(0.0, 300.0, 100.0, 16.0))]);
        assert!(find_landing(&set, &probe(100.0, 305.0, 10.0)).is_none());
    }

    #[test]
    fn first_platform_in_list_order_wins() {
        let set = PlatformSet::new(vec![
            Platform::visible(Rect::new(0.0, 300.0, 100.0, 16.0), "first"),
            Platform::visible(Rect::new(0.0, 302.0, 100.0, 16.0), "second"),
        ]);
        let hit = find_landing(&set, &probe(10.0, 305.0, 10.0)).expect("landing");
        assert_eq!(hit.kind, PlatformKind::Visible("first".to_string()));
    }

    #[test]
    fn snap_is_idempotent() {
        let once = snap_to_surface(300.0, 32.0, 32.0);
        assert_eq!(once, 236.0);
        let bottom = once + 32.0 + 32.0;
        assert_eq!(snap_to_surface(bottom, 32.0, 32.0), once);
    }

    #[test]
    fn set_keeps_declaration_order() {
        let set = PlatformSet::new(vec![
            Platform::invisible(Rect::new(0.0, 0.0, 1.0, 1.0)),
            Platform::visible(Rect::new(0.0, 0.0, 1.0, 1.0), "stone"),
        ]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.all()[0].kind, PlatformKind::Invisible);
        assert!(!set.is_empty());
    }

    #[test]
    fn touching_from_below_needs_top_inside_span() {
        let set = PlatformSet::new(vec![Platform::invisible(Rect::new(0.0, 200.0, 100.0, 16.0))]);
        assert!(touching_from_below(&set, 10.0, 40.0, 210.0));
        assert!(!touching_from_below(&set, 10.0, 40.0, 230.0));
        assert!(!touching_from_below(&set, 120.0, 150.0, 210.0));
    }
}
