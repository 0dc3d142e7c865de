#![allow(static_mut_refs)]

mod harness;

use std::{num::NonZero, path::PathBuf};

use big_input_mutator::BigInputMutator;
use libafl::{corpus::{Corpus, InMemoryCorpus, OnDiskCorpus}, events::SimpleEventManager, executors::InProcessExecutor, feedbacks::{CrashFeedback, MaxMapFeedback}, generators::RandPrintablesGenerator, inputs::{BytesInput, HasTargetBytes}, monitors::SimpleMonitor, mutators::{havoc_mutations, HavocScheduledMutator as StdScheduledMutator}, observers::StdMapObserver, schedulers::QueueScheduler, stages::StdMutationalStage, state::{HasSolutions, StdState}, Fuzzer, StdFuzzer};
#[cfg(feature = "tui")]
use libafl::monitors::TuiMonitor;
use libafl_bolts::{current_nanos, rands::StdRand, tuples::tuple_list, AsSlice};

use harness::{MAP_SIZE, SIGNALS_PTR};

fn main() {
    env_logger::init();

    // Links the fuzzer inputs to the target's copy and compare
    let mut harness = |input: &BytesInput| {
        let target = input.target_bytes();
        harness::run_target(target.as_slice())
    };

    let observer = unsafe { StdMapObserver::from_mut_ptr("MapObserver", SIGNALS_PTR, MAP_SIZE) };
    let mut feedback = MaxMapFeedback::new(&observer);
    let mut objective = CrashFeedback::new();

    let crash_dir = PathBuf::from("./crashes");

    let mut state = StdState::new(
        StdRand::with_seed(current_nanos()),
        InMemoryCorpus::new(),
        OnDiskCorpus::new(&crash_dir).unwrap(),
        &mut feedback,
        &mut objective
    )
    .expect("Failed to create state");

    #[cfg(not(feature = "tui"))]
    let monitor = SimpleMonitor::new(|msg| println!("[LOG] {msg}"));

    #[cfg(feature = "tui")]
    let monitor = TuiMonitor::builder()
        .title("Fuzzing the buggy target InProcess")
        .enhanced_graphics(false)
        .build();

    let mut mgr = SimpleEventManager::new(monitor);

    let scheduler = QueueScheduler::new();

    let mut fuzzer = StdFuzzer::new(scheduler, feedback, objective);

    let mut executor = InProcessExecutor::new(
        &mut harness,
        tuple_list!(observer),
        &mut fuzzer,
        &mut state,
        &mut mgr
    )
    .expect("Failed to create the Executor");

    // Forced so the corpus is never empty, even if every generated input already overflows
    let mut generator = RandPrintablesGenerator::new(NonZero::new(32).unwrap());
    state
        .generate_initial_inputs_forced(&mut fuzzer, &mut executor, &mut generator, &mut mgr, 8)
        .expect("Failed to generate the initial corpus");

    // The big input goes first, havoc takes over once it has been spent
    let big_input_stage = StdMutationalStage::new(BigInputMutator::new(current_nanos() as u32));
    let havoc_stage = StdMutationalStage::new(StdScheduledMutator::new(havoc_mutations()));
    let mut stages = tuple_list!(big_input_stage, havoc_stage);

    // Keep fuzzing until the first overflow has been found
    while state.solutions().is_empty() {
        fuzzer
            .fuzz_one(&mut stages, &mut executor, &mut state, &mut mgr)
            .expect("Failed to fuzz one");
    }

    println!(
        "[LOG] {} overflowing inputs for a {} byte buffer stored in {}",
        state.solutions().count(),
        buggy::BUFFER_CAPACITY,
        crash_dir.display()
    );
}
