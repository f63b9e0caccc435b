use commlife_core::{Direction, SimulationConfig, WorldConfig};
use commlife_ir::{Instruction, Opcode, Program, Register};
use commlife_world::{default_tasks, World};
use proptest::prelude::*;

fn config(width: usize, height: usize) -> SimulationConfig {
    let mut config = SimulationConfig {
        world: WorldConfig { width, height },
        ..SimulationConfig::default()
    };
    config.reproduction.mutation_rate = 0.0;
    config
}

fn nop_program() -> Program {
    Program::with_instructions(vec![Instruction::new(Opcode::Nop); 2])
}

/// Sends its own cell identity, reads its inbox, then asks to reproduce
fn messenger_program() -> Program {
    Program::with_instructions(vec![
        Instruction::unary(Opcode::GetIdentity, Register(0)),
        Instruction::unary(Opcode::SendMessage, Register(0)),
        Instruction::unary(Opcode::RetrieveMessage, Register(1)),
        Instruction::new(Opcode::Reproduce),
    ])
}

/// 2x1 world with an organism in each cell
fn pair_world() -> World {
    let mut world = World::new(config(2, 1), default_tasks()).unwrap();
    world.inject_at(nop_program(), 0).unwrap();
    world.inject_at(nop_program(), 1).unwrap();
    world
}

#[test]
fn mutually_facing_pair_exchanges_messages() {
    let mut world = pair_world();
    world.set_facing(0, Direction::East).unwrap();
    world.set_facing(1, Direction::West).unwrap();

    assert!(world.send_message(0, 55));
    assert_eq!(world.organism(1).unwrap().inbox(), 55);
    assert_eq!(world.exchange_counters().total_sent(), 1);
    assert_eq!(world.exchange_counters().sent_other(), 1);

    let identity = world.grid().identity(1);
    assert!(world.send_message(1, identity));
    assert_eq!(world.organism(0).unwrap().inbox(), identity);
    assert_eq!(world.exchange_counters().sent(1), 1);
}

#[test]
fn one_way_facing_pair_drops_messages() {
    let mut world = pair_world();
    world.set_facing(0, Direction::East).unwrap();
    world.set_facing(1, Direction::North).unwrap();

    assert!(!world.send_message(0, 55));
    assert_eq!(world.organism(1).unwrap().inbox(), 0);
    assert_eq!(world.exchange_counters().total_sent(), 0);
}

#[test]
fn zero_payload_and_empty_target_are_rejected() {
    let mut world = pair_world();
    world.set_facing(0, Direction::East).unwrap();
    world.set_facing(1, Direction::West).unwrap();

    assert!(!world.send_message(0, 0));

    world.extract_organism(1);
    assert!(!world.send_message(0, 55));
    assert!(!world.send_message(1, 55));
}

#[test]
fn retrieve_is_idempotent_and_counted() {
    let mut world = pair_world();
    world.set_facing(0, Direction::East).unwrap();
    world.set_facing(1, Direction::West).unwrap();

    let identity = world.grid().identity(0);
    world.send_message(0, identity);

    assert_eq!(world.retrieve_message(1), Some(identity));
    assert_eq!(world.retrieve_message(1), Some(identity));

    let state = world.organism(1).unwrap().state();
    assert_eq!(state.retrieved, identity);
    assert!(state.retrieved_values.contains(&identity));
    assert_eq!(world.exchange_counters().received(0), 2);
    assert_eq!(world.retrieve_message(5), None);
}

#[test]
fn reproduction_waits_for_end_of_tick() {
    let mut world = World::new(config(3, 3), default_tasks()).unwrap();
    let program = Program::with_instructions(vec![Instruction::new(Opcode::Reproduce)]);
    let parent = world.inject_at(program, 4).unwrap();
    world.organism_mut(4).unwrap().set_points(25.0);

    world.bind_all_organisms();
    world.process_all_organisms();

    let org = world.organism(4).unwrap();
    assert_eq!(org.id, parent);
    assert_eq!(org.age(), 1);
    assert_eq!(world.population_size(), 1);
    assert_eq!(world.pending_reproductions(), 1);

    world.reproduce_queued();

    assert_eq!(world.population_size(), 2);
    assert_eq!(world.organism(4).unwrap().points(), 0.0);
    let child = world
        .organisms()
        .find(|o| o.id != parent)
        .expect("offspring placed");
    assert_eq!(child.parent, Some(parent));
    assert_eq!(child.points(), 0.0);
}

/// Places a 4-instruction reproducer with enough points and runs one tick,
/// returning the offspring's genome length
fn offspring_length(insertion_rate: f64, deletion_rate: f64) -> usize {
    let mut config = config(3, 3);
    config.reproduction.insertion_rate = insertion_rate;
    config.reproduction.deletion_rate = deletion_rate;
    let mut world = World::new(config, default_tasks()).unwrap();

    let mut instructions = vec![Instruction::new(Opcode::Reproduce)];
    instructions.extend(vec![Instruction::new(Opcode::Nop); 3]);
    let parent = world
        .inject_at(Program::with_instructions(instructions), 4)
        .unwrap();
    world.organism_mut(4).unwrap().set_points(25.0);

    world.update();

    let child = world
        .organisms()
        .find(|o| o.id != parent)
        .expect("offspring placed");
    child.program().len()
}

#[test]
fn configured_edit_rates_reach_offspring() {
    assert_eq!(offspring_length(0.0, 0.0), 4);
    assert_eq!(offspring_length(1.0, 0.0), 8);
    assert_eq!(offspring_length(0.0, 1.0), 1);
}

#[test]
fn organism_data_describes_live_organisms() {
    let mut world = pair_world();
    world.organism_mut(1).unwrap().set_points(7.5);

    let data = world.organism_data();
    assert_eq!(data.len(), 2);
    let second = data
        .iter()
        .find(|d| d.location == Some(1))
        .expect("organism at 1");
    assert_eq!(second.points, 7.5);
    assert_eq!(second.genome, nop_program());

    let json = serde_json::to_string(&data).unwrap();
    assert!(json.contains("\"genome\""));
}

#[test]
fn below_threshold_does_not_reproduce() {
    let mut world = World::new(config(3, 3), default_tasks()).unwrap();
    let program = Program::with_instructions(vec![Instruction::new(Opcode::Reproduce)]);
    world.inject_at(program, 4).unwrap();
    world.organism_mut(4).unwrap().set_points(19.0);

    world.update();

    // 19 + 1 subsidy is not strictly above 20
    assert_eq!(world.population_size(), 1);
}

#[test]
fn single_column_sends_loop_back() {
    let mut world = World::new(config(1, 2), default_tasks()).unwrap();
    let program = Program::with_instructions(vec![
        Instruction::unary(Opcode::GetIdentity, Register(0)),
        Instruction::unary(Opcode::SendMessage, Register(0)),
    ]);
    world.inject_at(program, 0).unwrap();
    world.set_facing(0, Direction::East).unwrap();

    world.update();

    assert_eq!(world.organism(0).unwrap().inbox(), world.grid().identity(0));
}

#[test]
fn messaging_pair_learns_identities_and_reproduces() {
    let mut world = World::new(config(1, 2), default_tasks()).unwrap();
    world.inject_at(messenger_program(), 0).unwrap();
    world.inject_at(messenger_program(), 1).unwrap();
    world.set_facing(0, Direction::South).unwrap();
    world.set_facing(1, Direction::North).unwrap();

    world.bind_all_organisms();
    world.process_all_organisms();

    let learned = (0..2).any(|i| {
        let other = world.grid().identity(1 - i);
        world
            .organism(i)
            .is_some_and(|o| o.state().retrieved_values.contains(&other))
    });
    assert!(learned);

    world.reproduce_queued();
    assert!(world.snapshot().total_births >= 1);
    assert_eq!(world.population_size(), 2);

    for _ in 0..20 {
        world.update();
        assert!(world.organisms().all(|o| o.points() >= 0.0));
    }
}

#[test]
fn messaging_pair_grows_into_free_cells() {
    let mut world = World::new(config(4, 1), default_tasks()).unwrap();
    world.inject_at(messenger_program(), 0).unwrap();
    world.inject_at(messenger_program(), 1).unwrap();
    world.set_facing(0, Direction::East).unwrap();
    world.set_facing(1, Direction::West).unwrap();

    world.update();

    assert_eq!(world.population_size(), 4);
    assert!(world.solve_counts().get(2) >= 2);
}

#[test]
fn reset_counters_clears_reporting_state() {
    let mut world = World::new(config(4, 1), default_tasks()).unwrap();
    world.inject_at(messenger_program(), 0).unwrap();
    world.inject_at(messenger_program(), 1).unwrap();
    world.set_facing(0, Direction::East).unwrap();
    world.set_facing(1, Direction::West).unwrap();
    world.update();
    assert!(world.solve_counts().total() > 0);

    world.reset_counters();

    assert_eq!(world.solve_counts().total(), 0);
    assert_eq!(world.exchange_counters().total_sent(), 0);
    assert_eq!(world.exchange_counters().total_received(), 0);
}

#[test]
fn same_seed_same_history() {
    let run = || {
        let mut world = World::new(config(6, 6), default_tasks()).unwrap();
        for _ in 0..4 {
            world.inject_random().unwrap();
        }
        world.run(30);
        serde_json::to_string(&world.snapshot()).unwrap()
    };
    assert_eq!(run(), run());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn live_organisms_never_hold_negative_points(seed in any::<u64>()) {
        let mut config = SimulationConfig {
            seed,
            world: WorldConfig { width: 4, height: 4 },
            ..SimulationConfig::default()
        };
        config.execution.program_length = 20;
        let mut world = World::new(config, default_tasks()).unwrap();
        for _ in 0..4 {
            world.inject_random().unwrap();
        }

        for _ in 0..15 {
            world.update();
            for (index, cell) in world.grid().iter().enumerate() {
                prop_assert_eq!(cell.is_occupied(), world.is_occupied(index));
            }
            prop_assert!(world.organisms().all(|o| o.points() >= 0.0));
        }
    }
}
