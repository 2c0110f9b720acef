//! Headless raid simulation
//!
//! Builds a flat synthetic world with a handful of landmarks, walks
//! participants toward them and runs the scheduler loop: proximity scans,
//! platform ticks, simulated fighting, victory checks, claims and delayed
//! resets.

use ahash::AHashMap;
use clap::Parser;
use settlement_raids::core::{
    BlockPos, Participant, ParticipantId, RaidConfig, Result, SettlementKey, Tick,
};
use settlement_raids::raid::{RaidOrchestrator, TierTable};
use settlement_raids::services::{CooldownTracker, FixedLocator, FixedPower, RewardService};
use settlement_raids::settlements::{FileStore, KeyValueStore, MemoryStore, SettlementCache};
use settlement_raids::world::{BlockKind, MemoryWorld};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "raid_sim")]
#[command(about = "Run settlement raids against an in-memory world")]
struct Args {
    /// Number of scheduler ticks to run
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Number of participants walking the world
    #[arg(long, default_value_t = 3)]
    participants: usize,

    /// Random seed for defender counts (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Raid configuration TOML
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tier table TOML
    #[arg(long)]
    tiers: Option<PathBuf>,

    /// Persist settlements as JSON files in this directory
    #[arg(long)]
    store_dir: Option<PathBuf>,

    /// Surround landmarks with water and open a chasm under one of them
    #[arg(long)]
    water: bool,

    /// Power estimate reported for every participant
    #[arg(long, default_value_t = 0.8)]
    power: f64,

    /// Ticks between proximity scans
    #[arg(long, default_value_t = 20)]
    scan_interval: u64,

    /// Ticks between victory checks
    #[arg(long, default_value_t = 10)]
    victory_interval: u64,

    /// Ticks a conquered settlement waits before it resets
    #[arg(long, default_value_t = 200)]
    reset_delay: u64,
}

/// Cooldowns measured against the simulation clock
struct TickCooldowns {
    now: Tick,
    period: Tick,
    ready_at: AHashMap<(ParticipantId, SettlementKey), Tick>,
}

impl CooldownTracker for TickCooldowns {
    fn can_act_on(&self, participant: ParticipantId, key: &SettlementKey) -> bool {
        self.ready_at
            .get(&(participant, key.clone()))
            .map_or(true, |&ready| self.now >= ready)
    }

    fn record(&mut self, participant: ParticipantId, key: &SettlementKey) {
        self.ready_at
            .insert((participant, key.clone()), self.now + self.period);
    }
}

#[derive(Default)]
struct Treasury {
    balances: AHashMap<ParticipantId, u64>,
}

impl RewardService for Treasury {
    fn grant(&mut self, participant: ParticipantId, key: &SettlementKey, amount: u64) {
        *self.balances.entry(participant).or_insert(0) += amount;
        tracing::debug!("Paid {} to {} for {}", amount, participant, key);
    }
}

const LANDMARKS: [(i32, i32); 5] = [(0, 0), (220, 40), (-180, -150), (150, 180), (-120, 200)];

fn build_world(landmarks: &[BlockPos], water: bool) -> MemoryWorld {
    let mut world = MemoryWorld::flat(63, 320, BlockKind::Solid);
    if !water {
        return world;
    }

    for (i, &at) in landmarks.iter().enumerate() {
        let at_y = |dx: i32, y: i32, dz: i32| BlockPos::new(at.x + dx, y, at.z + dz);
        if i == landmarks.len() - 1 {
            // No ground at all: defenders here stand on platforms
            world.fill_box(at_y(-20, 63, -20), at_y(20, 63, 20), BlockKind::Air);
            continue;
        }
        // A moat with a solid bed, leaving an island in the middle
        world.fill_box(at_y(-16, 60, -16), at_y(16, 60, 16), BlockKind::Solid);
        world.fill_box(at_y(-16, 61, -16), at_y(16, 63, 16), BlockKind::Water);
        world.fill_box(at_y(-4, 61, -4), at_y(4, 63, 4), BlockKind::Solid);
    }
    world
}

fn load_config(args: &Args) -> Result<(RaidConfig, TierTable)> {
    let mut config = match &args.config {
        Some(path) => RaidConfig::from_toml_str(&std::fs::read_to_string(path)?)?,
        None => RaidConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let tiers = match &args.tiers {
        Some(path) => TierTable::from_toml_str(&std::fs::read_to_string(path)?)?,
        None => TierTable::default(),
    };
    Ok((config, tiers))
}

/// Move `from` up to `step` blocks toward `to` on the horizontal plane
fn walk_toward(from: BlockPos, to: BlockPos, step: i32) -> BlockPos {
    let dx = (to.x - from.x).clamp(-step, step);
    let dz = (to.z - from.z).clamp(-step, step);
    BlockPos::new(from.x + dx, from.y, from.z + dz)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "settlement_raids=info".into()),
        )
        .init();

    let args = Args::parse();
    let (config, tiers) = load_config(&args)?;

    let landmarks: Vec<BlockPos> = LANDMARKS
        .iter()
        .map(|&(x, z)| BlockPos::new(x, 64, z))
        .collect();
    let mut world = build_world(&landmarks, args.water);
    let locator = FixedLocator::new(landmarks.clone());

    let store: Box<dyn KeyValueStore> = match &args.store_dir {
        Some(dir) => Box::new(FileStore::new(dir)),
        None => Box::new(MemoryStore::new()),
    };
    let cache = SettlementCache::load(store, &config);
    let mut orchestrator = RaidOrchestrator::new(config, cache, tiers);

    let mut participants: Vec<Participant> = (0..args.participants)
        .map(|_| Participant::new(ParticipantId::new(), BlockPos::new(0, 64, -300)))
        .collect();
    let power = FixedPower(args.power);
    let mut cooldowns = TickCooldowns {
        now: 0,
        period: args.reset_delay * 2,
        ready_at: AHashMap::new(),
    };
    let mut treasury = Treasury::default();
    let mut resets: Vec<(Tick, SettlementKey)> = Vec::new();
    let mut conquests = 0usize;

    tracing::info!(
        "Running {} ticks with {} participants ({:?} difficulty)",
        args.ticks,
        participants.len(),
        orchestrator.config().strategy
    );

    for tick in 0..args.ticks {
        cooldowns.now = tick;

        // Each participant tours the landmarks, lingering near each one
        for (i, participant) in participants.iter_mut().enumerate() {
            let leg = (tick / 120) as usize + i;
            let target = landmarks[leg % landmarks.len()];
            participant.position = walk_toward(participant.position, target, 4);
        }

        if tick % args.scan_interval.max(1) == 0 {
            let report =
                orchestrator.scan_proximity(&mut world, &participants, &locator, &power, &cooldowns, tick);
            if !report.activated.is_empty() || report.pending > 0 {
                tracing::info!(
                    "Tick {}: {} discovered, {} activated, {} placed, {} pending",
                    tick,
                    report.discovered.len(),
                    report.activated.len(),
                    report.placed,
                    report.pending
                );
            }
        }

        orchestrator.tick_platforms(&mut world);

        if tick % args.victory_interval.max(1) == 0 {
            // Participants standing near defenders win their fights
            for participant in &participants {
                world.kill_within(participant.position, 16.0);
            }

            for key in orchestrator.check_victories(&world) {
                conquests += 1;
                let Some(location) = orchestrator.raid_state(&key).map(|s| s.location) else {
                    continue;
                };
                let claimer = participants.iter().min_by_key(|p| {
                    let d = p.position - location;
                    d.x * d.x + d.z * d.z
                });
                if let Some(claimer) = claimer {
                    orchestrator.claim_conquest(claimer.id, &key, &mut cooldowns, &mut treasury);
                }
                resets.push((tick + args.reset_delay, key));
            }
        }

        resets.retain(|(due, key)| {
            if *due > tick {
                return true;
            }
            orchestrator.reset_settlement(key);
            false
        });
    }

    println!("Settlements known: {}", orchestrator.cache().len());
    println!("Conquests: {}", conquests);
    println!("Still active: {}", orchestrator.get_active_settlements().len());
    println!("Living creatures: {}", world.living_count());
    for participant in &participants {
        let balance = treasury.balances.get(&participant.id).copied().unwrap_or(0);
        let suggestions = orchestrator.suggested_settlements(participant, &power);
        println!(
            "  {}: {} coins, {} conquests, next suggestion {}",
            participant.id,
            balance,
            orchestrator.cache().conquests_by(participant.id),
            suggestions
                .first()
                .map(|s| format!("{} ({})", s.key, s.tier))
                .unwrap_or_else(|| "none".to_string())
        );
    }

    Ok(())
}
