use ck_core::geometry::Vec2;
use ck_core::input::{Action, InputState};
use serde::Deserialize;

use crate::config::Playfield;
use crate::platform::{find_landing, snap_to_surface, touching_from_below, LandingProbe, PlatformSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacterAction {
    Idle,
    Run,
    Jump,
    Roll,
    Death,
}

impl CharacterAction {
    /// Name of the sprite-sheet clip that shows this action.
    pub fn clip_name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Run => "run",
            Self::Jump => "jump",
            Self::Roll => "roll",
            Self::Death => "death",
        }
    }
}

impl std::fmt::Display for CharacterAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.clip_name())
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ControllerConfig {
    /// Sprite cell size in sheet pixels.
    pub width: f32,
    pub height: f32,
    /// Drawn size is `width * render_scale`.
    pub render_scale: f32,
    /// Shrink applied to both sides of the drawn width for platform overlap.
    pub collision_inset: f32,
    /// Transparent padding below the sprite cell counted into the collision-bottom.
    pub collision_y_offset: f32,
    pub speed: f32,
    pub roll_speed: f32,
    pub gravity: f32,
    pub jump_impulse: f32,
    pub jump_cooldown_max: u32,
    pub roll_cooldown_max: u32,
    pub roll_frame_count: u32,
    pub roll_stagger_ticks: u32,
    /// Value the roll timer starts from when a roll is entered.
    pub roll_timer_prime: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            width: 32.0,
            height: 32.0,
            render_scale: 2.0,
            collision_inset: 16.0,
            collision_y_offset: 32.0,
            speed: 3.0,
            roll_speed: 5.0,
            gravity: 1.0,
            jump_impulse: 14.0,
            jump_cooldown_max: 30,
            roll_cooldown_max: 45,
            roll_frame_count: 8,
            roll_stagger_ticks: 5,
            roll_timer_prime: 0,
        }
    }
}

impl ControllerConfig {
    /// Roll timer value at which a roll ends: one full pass of the roll clip.
    pub fn roll_duration(&self) -> u32 {
        self.roll_frame_count.saturating_mul(self.roll_stagger_ticks)
    }

    pub fn draw_width(&self) -> f32 {
        self.width * self.render_scale
    }

    /// Lowest `y` a living character may occupy.
    pub fn floor_y(&self, playfield: &Playfield) -> f32 {
        playfield.height - self.height
    }
}

/// What happened during one `update`, for event reporting and logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub jumped: bool,
    pub landed: bool,
    pub roll_started: bool,
    pub roll_finished: bool,
    pub died: bool,
    pub respawned: bool,
}

#[derive(Debug, Clone)]
pub struct CharacterController {
    pub position: Vec2,
    pub velocity_y: f32,
    pub facing_left: bool,
    pub action: CharacterAction,
    pub is_rolling: bool,
    pub roll_timer: u32,
    pub jump_cooldown: u32,
    pub roll_cooldown: u32,
    /// Result of the last landing test.
    pub on_ground: bool,
    pub spawn: Vec2,
    pub config: ControllerConfig,
}

impl CharacterController {
    pub fn new(spawn: Vec2, config: ControllerConfig) -> Self {
        Self {
            position: spawn,
            velocity_y: 0.0,
            facing_left: false,
            action: CharacterAction::Idle,
            is_rolling: false,
            roll_timer: 0,
            jump_cooldown: 0,
            roll_cooldown: 0,
            on_ground: false,
            spawn,
            config,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.action == CharacterAction::Death
    }

    /// One tick, rules in priority order: roll continuation (returns early),
    /// cooldown decay, horizontal input, jump, roll entry, idle fallback,
    /// horizontal clamp, vertical step with landing, death and reset, floor clamp.
    pub fn update(
        &mut self,
        input: &InputState,
        platforms: &PlatformSet,
        playfield: &Playfield,
    ) -> TickReport {
        let mut report = TickReport::default();
        let dead = self.is_dead();

        if self.is_rolling && !dead {
            self.roll_timer += 1;
            self.position.x += self.facing_signed(self.config.roll_speed);
            if self.roll_timer >= self.config.roll_duration() {
                self.is_rolling = false;
                self.roll_timer = 0;
                self.action = CharacterAction::Idle;
                report.roll_finished = true;
                log::trace!("Roll finished at x={:.1}", self.position.x);
            }
            return report;
        }

        self.jump_cooldown = self.jump_cooldown.saturating_sub(1);
        self.roll_cooldown = self.roll_cooldown.saturating_sub(1);

        let mut moved = false;
        if !dead {
            if input.is_held(Action::MoveRight) {
                self.position.x += self.config.speed;
                self.action = CharacterAction::Run;
                self.facing_left = false;
                moved = true;
            } else if input.is_held(Action::MoveLeft) {
                self.position.x -= self.config.speed;
                self.action = CharacterAction::Run;
                self.facing_left = true;
                moved = true;
            }
        }

        let on_ground = !dead && self.ground_contact(platforms);

        if input.is_held(Action::Jump) && on_ground && self.jump_cooldown == 0 && !dead {
            self.velocity_y -= self.config.jump_impulse;
            self.jump_cooldown = self.config.jump_cooldown_max;
            report.jumped = true;
        }

        let mut rolled = false;
        if input.is_held(Action::Roll)
            && !self.is_rolling
            && (on_ground || self.pressed_under_platform(platforms))
            && self.roll_cooldown == 0
            && !dead
        {
            self.action = CharacterAction::Roll;
            self.is_rolling = true;
            self.roll_timer = self.config.roll_timer_prime;
            self.roll_cooldown = self.config.roll_cooldown_max;
            rolled = true;
            report.roll_started = true;
            log::trace!("Roll started at x={:.1}", self.position.x);
        }

        if !moved && !rolled && !dead {
            self.action = CharacterAction::Idle;
        }

        let max_x = playfield.width + self.config.draw_width();
        self.position.x = self.position.x.clamp(0.0, max_x);

        self.position.y += self.velocity_y;
        let landed = !dead && self.resolve_landing(platforms);
        self.on_ground = landed;
        if landed {
            report.landed = self.velocity_y > 0.0;
            self.velocity_y = 0.0;
        } else if !dead {
            self.velocity_y += self.config.gravity;
            if self.action != CharacterAction::Roll {
                self.action = CharacterAction::Jump;
            }
        }

        let floor_y = self.config.floor_y(playfield);
        if self.position.y > floor_y && !self.is_dead() {
            self.action = CharacterAction::Death;
            self.is_rolling = false;
            report.died = true;
            log::debug!("Character fell below the floor at x={:.1}", self.position.x);
        }
        // Reset confirms a death from an earlier tick, never the one just entered.
        if dead && input.is_held(Action::Reset) {
            self.respawn();
            report.respawned = true;
        }

        if self.position.y > floor_y {
            self.position.y = floor_y;
            self.velocity_y = 0.0;
        }

        report
    }

    /// Restore spawn position and clear all motion, timers and cooldowns.
    pub fn respawn(&mut self) {
        self.position = self.spawn;
        self.velocity_y = 0.0;
        self.action = CharacterAction::Idle;
        self.is_rolling = false;
        self.roll_timer = 0;
        self.jump_cooldown = 0;
        self.roll_cooldown = 0;
        self.on_ground = false;
    }

    /// Horizontal collision span: the drawn width shrunk by the inset on both sides.
    pub fn collision_span(&self) -> (f32, f32) {
        let left = self.position.x + self.config.collision_inset;
        let right = self.position.x + self.config.draw_width() - self.config.collision_inset;
        (left, right)
    }

    pub fn collision_bottom(&self) -> f32 {
        self.position.y + self.config.height + self.config.collision_y_offset
    }

    fn probe(&self) -> LandingProbe {
        let (left, right) = self.collision_span();
        LandingProbe {
            left,
            right,
            bottom: self.collision_bottom(),
            velocity_y: self.velocity_y,
        }
    }

    /// OnGround without side effects: a platform matches and motion is not upward.
    pub fn ground_contact(&self, platforms: &PlatformSet) -> bool {
        self.velocity_y >= 0.0 && find_landing(platforms, &self.probe()).is_some()
    }

    /// Landing test after the vertical step. Snaps `y` onto the first matching
    /// platform and reports whether that counts as standing on it.
    fn resolve_landing(&mut self, platforms: &PlatformSet) -> bool {
        let Some(platform) = find_landing(platforms, &self.probe()) else {
            return false;
        };
        self.position.y = snap_to_surface(
            platform.top(),
            self.config.height,
            self.config.collision_y_offset,
        );
        self.velocity_y >= 0.0
    }

    fn pressed_under_platform(&self, platforms: &PlatformSet) -> bool {
        let (left, right) = self.collision_span();
        touching_from_below(platforms, left, right, self.position.y)
    }

    fn facing_signed(&self, magnitude: f32) -> f32 {
        if self.facing_left {
            -magnitude
        } else {
            magnitude
        }
    }
}
