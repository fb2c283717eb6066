//! SpaceDust Headless Simulation Harness
//!
//! Validates resource fields, discovery and harvesting against the bundled
//! data. Runs entirely in-process, no game, no rendering.
//!
//! Usage:
//!   cargo run -p spacedust-simtest
//!   cargo run -p spacedust-simtest -- --verbose
//!   RUST_LOG=debug cargo run -p spacedust-simtest

use serde::Deserialize;
use spacedust_core::prelude::*;
use spacedust_logic::geometry::DVec3;
use spacedust_logic::harvest::{HarvestedResource, HarvesterConfig};
use spacedust_logic::inventory::{ResourceInventory, ResourceSink, ELECTRIC_CHARGE};
use spacedust_logic::resource_map::LoadContext;
use spacedust_logic::{
    BodyCatalog, DiscoveryTracker, DistributionModel, HarvestType, ResourceMap, Settings, SurveyKind,
};

// ── Bundled documents ───────────────────────────────────────────────────
const SETTINGS_JSON: &str = include_str!("../../../data/settings.json");
const BODIES_JSON: &str = include_str!("../../../data/bodies.json");
const RESOURCES_JSON: &str = include_str!("../../../data/resources.json");
const INSTRUMENTS_JSON: &str = include_str!("../../../data/instruments.json");
const DENSITIES_JSON: &str = include_str!("../../../data/resource_densities.json");

const DATA: SessionData<'static> = SessionData {
    settings: SETTINGS_JSON,
    bodies: BODIES_JSON,
    resources: RESOURCES_JSON,
    instruments: INSTRUMENTS_JSON,
    densities: DENSITIES_JSON,
};

const SEED: u64 = 0x5EED_D057;

/// Just enough of a resource declaration to cross-check the loaded map.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeclarationOutline {
    resource_name: String,
    body: String,
    bands: Vec<serde_json::Value>,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let verbose = std::env::args().any(|a| a == "--verbose");
    log::info!("Harness seed {:#x}", SEED);
    println!("=== SpaceDust Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Bundled data loads and matches its declarations
    results.extend(validate_data(verbose));

    // 2. Same seed, same fields
    results.extend(validate_determinism(verbose));

    // 3. Samples stay inside their shells
    results.extend(validate_containment(verbose));

    // 4. Reference concentrations
    results.extend(validate_reference_values(verbose));

    // 5. Discovery state machine
    results.extend(validate_discovery(verbose));

    // 6. Loaded vs on-rails harvesting
    results.extend(validate_harvest_equivalence(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn load_map(seed: u64, settings: &Settings) -> Option<(BodyCatalog, ResourceMap, DiscoveryTracker)> {
    let bodies = BodyCatalog::from_json(BODIES_JSON).ok()?;
    let mut tracker = DiscoveryTracker::new(settings);
    let ctx = LoadContext {
        bodies: &bodies,
        settings,
        game_seed: seed,
    };
    let (map, _) = ResourceMap::load_json(RESOURCES_JSON, &ctx, &mut tracker).ok()?;
    Some((bodies, map, tracker))
}

fn failure(name: &str, detail: String) -> Vec<TestResult> {
    vec![TestResult {
        name: name.into(),
        passed: false,
        detail,
    }]
}

// ── 1. Bundled data ─────────────────────────────────────────────────────

fn validate_data(verbose: bool) -> Vec<TestResult> {
    println!("--- Bundled Data ---");
    let mut results = Vec::new();

    let outline: Vec<DeclarationOutline> = match serde_json::from_str(RESOURCES_JSON) {
        Ok(o) => o,
        Err(e) => return failure("data_parse", format!("JSON parse error: {}", e)),
    };
    let (session, _, report) = match Session::load(&DATA, SEED) {
        Ok(s) => s,
        Err(e) => return failure("data_session", format!("session load error: {}", e)),
    };

    results.push(TestResult {
        name: "data_no_skipped_declarations".into(),
        passed: report.skipped.is_empty(),
        detail: format!("{} skipped", report.skipped.len()),
    });

    let declared_bands: usize = outline.iter().map(|d| d.bands.len()).sum();
    results.push(TestResult {
        name: "data_band_count".into(),
        passed: report.bands == declared_bands && report.distributions == outline.len(),
        detail: format!(
            "{} distributions / {} bands loaded, {} / {} declared",
            report.distributions,
            report.bands,
            outline.len(),
            declared_bands
        ),
    });

    // Every declared resource is reachable through the map
    let missing: Vec<_> = outline
        .iter()
        .filter(|d| session.map.body_distributions(&d.body, &d.resource_name).is_empty())
        .map(|d| format!("{}@{}", d.resource_name, d.body))
        .collect();
    results.push(TestResult {
        name: "data_declarations_reachable".into(),
        passed: missing.is_empty(),
        detail: if missing.is_empty() {
            "all declarations queryable".into()
        } else {
            format!("unreachable: {}", missing.join(", "))
        },
    });

    // Bands on bodies the catalog lacks load but stay at the origin
    let unknown: Vec<_> = session
        .map
        .all_bands()
        .filter(|b| session.bodies.get(&b.body_name).is_none())
        .collect();
    results.push(TestResult {
        name: "data_unknown_bodies_inert".into(),
        passed: unknown.iter().all(|b| b.body_radius() == 0.0),
        detail: format!("{} bands on unknown bodies", unknown.len()),
    });

    // Every instrument surveys a resource that exists somewhere
    let orphans: Vec<_> = ["SDUVSpectrometer", "SDIRSpectrometer", "SDGammaSpectrometer"]
        .iter()
        .filter(|name| {
            session.instruments.get(name).map_or(true, |inst| {
                !session.map.all_bands().any(|b| b.resource_name == inst.resource_name)
            })
        })
        .collect();
    results.push(TestResult {
        name: "data_instruments_have_targets".into(),
        passed: orphans.is_empty(),
        detail: format!("{} instruments, {} without a resource", session.instruments.len(), orphans.len()),
    });

    if verbose {
        println!("  Bands by body:");
        let mut bodies: Vec<_> = session.map.bodies().collect();
        bodies.sort_unstable();
        for body in bodies {
            for band in session.map.distributions(body).iter().flat_map(|d| d.bands()) {
                println!("    {:8} {}", body, band);
            }
        }
    }

    results
}

// ── 2. Determinism ──────────────────────────────────────────────────────

fn validate_determinism(_verbose: bool) -> Vec<TestResult> {
    println!("--- Determinism ---");
    let mut results = Vec::new();
    let settings = Settings::default();

    let (Some((bodies, a, _)), Some((_, b, _)), Some((_, c, _))) = (
        load_map(SEED, &settings),
        load_map(SEED, &settings),
        load_map(SEED + 1, &settings),
    ) else {
        return failure("determinism_load", "bundled data failed to load".into());
    };

    let mut mismatches = 0;
    let mut differs = 0;
    let mut probes = 0;
    for body in bodies.iter() {
        for resource in a.body_resources(&body.name) {
            for i in 0..=400 {
                let t = i as f64 / 400.0;
                let alt = body.radius + t * 8_000_000.0;
                let lat = t * 180.0 - 90.0;
                let sa = a.sample(resource, &body.name, alt, lat, 0.0);
                let sb = b.sample(resource, &body.name, alt, lat, 0.0);
                let sc = c.sample(resource, &body.name, alt, lat, 0.0);
                probes += 1;
                if sa.to_bits() != sb.to_bits() {
                    mismatches += 1;
                }
                if sa != sc {
                    differs += 1;
                }
            }
        }
    }
    results.push(TestResult {
        name: "determinism_same_seed".into(),
        passed: mismatches == 0,
        detail: format!("{} / {} probes differ", mismatches, probes),
    });
    results.push(TestResult {
        name: "determinism_seed_matters".into(),
        passed: differs > 0,
        detail: format!("{} / {} probes changed with the seed", differs, probes),
    });

    results
}

// ── 3. Shell containment ────────────────────────────────────────────────

fn validate_containment(verbose: bool) -> Vec<TestResult> {
    println!("--- Shell Containment ---");
    let mut results = Vec::new();

    let Some((_, map, _)) = load_map(SEED, &Settings::default()) else {
        return failure("containment_load", "bundled data failed to load".into());
    };

    let mut escaped = Vec::new();
    let mut shells = 0;
    for band in map.all_bands() {
        let DistributionModel::Spherical(shell) = band.distribution() else {
            continue;
        };
        shells += 1;
        for li in 0..=36 {
            let lat = li as f64 * 5.0 - 90.0;
            let (min_alt, max_alt) = shell.altitude_bounds_at(lat);
            for ai in 0..=200 {
                let rel = shell.max_altitude * 1.5 * ai as f64 / 200.0;
                let s = band.sample(band.body_radius() + rel, lat, 0.0);
                let inside =
                    lat >= shell.min_latitude && lat <= shell.max_latitude && rel >= min_alt && rel <= max_alt;
                if s != 0.0 && !inside {
                    escaped.push(format!("{} lat={} alt={}", band.name, lat, rel));
                }
            }
        }
        if verbose {
            println!(
                "  {}: lat [{:.1}, {:.1}] alt [{:.0}, {:.0}] peak {:.0}",
                band.name,
                shell.min_latitude,
                shell.max_latitude,
                shell.min_altitude,
                shell.max_altitude,
                shell.center_altitude
            );
        }
    }
    results.push(TestResult {
        name: "containment_spherical".into(),
        passed: escaped.is_empty() && shells > 0,
        detail: if escaped.is_empty() {
            format!("{} shells, no sample outside bounds", shells)
        } else {
            format!("{} escapes, first: {}", escaped.len(), escaped[0])
        },
    });

    results
}

// ── 4. Reference values ─────────────────────────────────────────────────

const REFERENCE_JSON: &str = r#"[
    {"resourceName": "Flat", "body": "Mun", "bands": [
        {"name": "Everywhere", "minAbundance": 2, "maxAbundance": 2}
    ]},
    {"resourceName": "Peaked", "body": "Mun", "bands": [
        {"name": "Shell", "minAbundance": 3, "maxAbundance": 3,
         "distributionType": "Spherical",
         "altLowerBound": 0, "altUpperBound": 100000, "altPeak": 50000,
         "altFalloffType": "Linear"}
    ]},
    {"resourceName": "Stacked", "body": "Mun", "bands": [
        {"name": "A", "minAbundance": 1, "maxAbundance": 1},
        {"name": "B", "minAbundance": 0.25, "maxAbundance": 0.25}
    ]}
]"#;

fn validate_reference_values(_verbose: bool) -> Vec<TestResult> {
    println!("--- Reference Values ---");
    let mut results = Vec::new();

    let settings = Settings::default();
    let Ok(bodies) = BodyCatalog::from_json(BODIES_JSON) else {
        return failure("reference_bodies", "body catalog failed to load".into());
    };
    let mut tracker = DiscoveryTracker::new(&settings);
    let ctx = LoadContext {
        bodies: &bodies,
        settings: &settings,
        game_seed: SEED,
    };
    let map = match ResourceMap::load_json(REFERENCE_JSON, &ctx, &mut tracker) {
        Ok((map, _)) => map,
        Err(e) => return failure("reference_load", format!("{}", e)),
    };
    let radius = 200_000.0;

    let flat: Vec<f64> = [(0.0, -90.0), (radius, 0.0), (1.0e9, 45.0)]
        .iter()
        .map(|&(alt, lat)| map.sample("Flat", "Mun", alt, lat, 12.0))
        .collect();
    results.push(TestResult {
        name: "reference_uniform".into(),
        passed: flat.iter().all(|&s| s == 2.0),
        detail: format!("samples {:?}", flat),
    });

    let half = map.sample("Peaked", "Mun", radius + 75_000.0, 0.0, 0.0);
    let peak = map.sample("Peaked", "Mun", radius + 50_000.0, 0.0, 0.0);
    results.push(TestResult {
        name: "reference_linear_falloff".into(),
        passed: (half - 1.5).abs() < 1e-12 && (peak - 3.0).abs() < 1e-12,
        detail: format!("75 km: {} (want 1.5), 50 km: {} (want 3)", half, peak),
    });

    let stacked = map.sample("Stacked", "Mun", radius, 0.0, 0.0);
    results.push(TestResult {
        name: "reference_additive_bands".into(),
        passed: stacked == 1.25,
        detail: format!("two bands sum to {}", stacked),
    });

    results
}

// ── 5. Discovery ────────────────────────────────────────────────────────

fn validate_discovery(_verbose: bool) -> Vec<TestResult> {
    println!("--- Discovery ---");
    let mut results = Vec::new();

    let settings = Settings::default();
    let Some((_, map, mut tracker)) = load_map(SEED, &settings) else {
        return failure("discovery_load", "bundled data failed to load".into());
    };
    let Some(jool) = map.band("Jool", "Antimatter", "JoolBelt").cloned() else {
        return failure("discovery_band", "JoolBelt missing".into());
    };

    // Repeated discovery pays once
    let mut transitions = 0;
    for _ in 0..1000 {
        if tracker.discover(&jool, true) {
            transitions += 1;
        }
    }
    results.push(TestResult {
        name: "discovery_single_reward".into(),
        passed: transitions == 1 && tracker.science_awarded() == 20.0 * 7.0,
        detail: format!("{} transitions, {} science", transitions, tracker.science_awarded()),
    });

    // Identification progress crosses at exactly 100
    let mut fired_early = false;
    for _ in 0..99 {
        fired_early |= tracker.add_progress(SurveyKind::Identification, &jool, 1.0);
    }
    let at_99 = tracker.is_identified("Antimatter", "JoolBelt", "Jool");
    let crossed = tracker.add_progress(SurveyKind::Identification, &jool, 1.0);
    results.push(TestResult {
        name: "discovery_threshold".into(),
        passed: !fired_early && !at_99 && crossed,
        detail: format!("identified at 99: {}, crossed at 100: {}", at_99, crossed),
    });

    // Undiscovered bands ignore identification progress
    let Some(mun) = map.band("Mun", "LqdHe3", "MunExosphere").cloned() else {
        return failure("discovery_band", "MunExosphere missing".into());
    };
    tracker.add_progress(SurveyKind::Identification, &mun, 500.0);
    let progress = tracker.band_survey_progress("LqdHe3", "MunExosphere", "Mun");
    results.push(TestResult {
        name: "discovery_identify_gated".into(),
        passed: progress.identify_percent == 0.0 && !progress.identified,
        detail: format!("identify progress {}", progress.identify_percent),
    });

    // Snapshot survives a restore
    let snapshot = tracker.snapshot();
    let mut restored = DiscoveryTracker::new(&settings);
    restored.restore(snapshot.clone());
    results.push(TestResult {
        name: "discovery_snapshot_restore".into(),
        passed: restored.snapshot() == snapshot,
        detail: format!("{} records", snapshot.records.len()),
    });

    results
}

// ── 6. Harvest equivalence ──────────────────────────────────────────────

fn collector(name: &str) -> VesselSpec {
    VesselSpec {
        inventory: ResourceInventory::new()
            .with_tank(ELECTRIC_CHARGE, 10_000.0, 10_000.0)
            .with_tank("LqdHe3", 0.0, 1.0e12),
        harvesters: vec![HarvesterConfig {
            harvest_type: HarvestType::Exosphere,
            intake_area: 3.0,
            intake_speed_static: 10.0,
            power_cost: 1.0,
            resources: vec![HarvestedResource {
                name: "LqdHe3".into(),
                base_efficiency: 1.0,
                min_harvest_value: 0.0,
            }],
            ..HarvesterConfig::default()
        }],
        ..VesselSpec::new(
            name,
            FlightState {
                orbital_velocity: DVec3::new(2_200.0, 0.0, 0.0),
                ..FlightState::at("Kerbin", 1_000_000.0, 5.0, 0.0)
            },
        )
    }
}

fn validate_harvest_equivalence(verbose: bool) -> Vec<TestResult> {
    println!("--- Harvest Equivalence ---");
    let mut results = Vec::new();

    let (mut engine, _) = match SimulationEngine::from_data(&DATA, SEED) {
        Ok(e) => e,
        Err(e) => return failure("harvest_engine", format!("{}", e)),
    };
    let live = engine.spawn_vessel(collector("Live"));
    let parked = engine.spawn_vessel(collector("Parked"));
    engine.go_on_rails(parked);

    for _ in 0..10 {
        engine.update(1.0);
    }
    let amounts = (engine.inventory(live), engine.inventory(parked));
    let (Some(a), Some(b)) = amounts else {
        return failure("harvest_inventory", "vessel inventory missing".into());
    };
    let (fa, fb) = (a.amount("LqdHe3"), b.amount("LqdHe3"));
    let rel = if fa > 0.0 { ((fa - fb) / fa).abs() } else { f64::INFINITY };
    results.push(TestResult {
        name: "harvest_foreground_background".into(),
        passed: rel < 1e-6,
        detail: format!("loaded {:.6e}, on rails {:.6e}, rel diff {:.2e}", fa, fb, rel),
    });
    results.push(TestResult {
        name: "harvest_power_drawn".into(),
        passed: a.amount(ELECTRIC_CHARGE) == b.amount(ELECTRIC_CHARGE) && a.amount(ELECTRIC_CHARGE) < 10_000.0,
        detail: format!("EC left {} / {}", a.amount(ELECTRIC_CHARGE), b.amount(ELECTRIC_CHARGE)),
    });

    if verbose {
        for event in engine.drain_events() {
            println!("  event: {}", event);
        }
    }

    results
}
