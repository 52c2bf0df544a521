/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and stats.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameEvent {
    PlayerMoved { x: i32, y: i32 },
    /// A box (either flavour) was shoved into (x, y).
    BoxPushed { x: i32, y: i32 },
    MonsterBounced { x: i32, y: i32 },
    /// A sticky box caught the monster standing at (x, y).
    MonsterCaptured { x: i32, y: i32 },
    MonsterReleased { x: i32, y: i32 },
    MonsterKilled { x: i32, y: i32 },
    PlayerCaught { x: i32, y: i32 },
    StageCleared,
}
