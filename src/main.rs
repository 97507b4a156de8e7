//! Main entry point for the rcollect application.

use clap::Parser;
use log::error;
use rcollect::cli::{exit_codes, Args};
use rcollect::config::{find_project_root, read_collect_config, read_collect_config_file};
use rcollect::logging::{self, Verbosity};
use rcollect::{display_collection_results, tests_to_json, Session, SourceImporter, Test};
use std::env;

fn main() {
    let args = Args::parse();
    logging::init(Verbosity::from_flags(args.verbose, args.quiet));
    std::process::exit(run(&args));
}

fn run(args: &Args) -> i32 {
    let cwd = match env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            error!("Failed to get current directory: {e}");
            return exit_codes::USAGE_ERROR;
        }
    };

    let (rootpath, config) = match &args.config {
        Some(path) => {
            let rootpath = path
                .parent()
                .map(|p| cwd.join(p))
                .unwrap_or_else(|| cwd.clone());
            (rootpath, read_collect_config_file(path))
        }
        None => {
            let rootpath = find_project_root(&args.absolute_paths(&cwd), &cwd);
            let config = read_collect_config(&rootpath);
            (rootpath, config)
        }
    };

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return exit_codes::USAGE_ERROR;
        }
    };

    let session = match Session::new(rootpath, args.collection_options(config, &cwd)) {
        Ok(session) => session,
        Err(e) => {
            error!("{e}");
            return exit_codes::USAGE_ERROR;
        }
    };

    let (tests, errors) = session.collect_tests(&SourceImporter::new());
    let selected: Vec<Test> = session.select(&tests).cloned().collect();

    if args.json {
        match tests_to_json(&selected) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                error!("Failed to serialize tests: {e}");
                return exit_codes::COLLECTION_ERRORS;
            }
        }
    } else {
        display_collection_results(&selected, &errors);
    }

    if !errors.is_empty() {
        exit_codes::COLLECTION_ERRORS
    } else if selected.is_empty() {
        exit_codes::NO_TESTS_SELECTED
    } else {
        exit_codes::OK
    }
}
