use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, info};
use tagit::{
    arguments::Arguments,
    git::GitTracker,
    release::{Release, ReleaseOptions},
    schemes::SchemeRegistry,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = match Arguments::try_parse() {
        Ok(args) => args,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            std::process::exit(1);
        }
        Err(e) => e.exit(),
    };
    pretty_env_logger::env_logger::builder()
        .filter_level(if args.verbose { LevelFilter::Debug } else { LevelFilter::Info })
        .format_timestamp(None)
        .init();

    let mut schemes = SchemeRegistry::builtin()?;
    if let Some(scheme_file) = &args.scheme_file {
        schemes = schemes.extend_from_file(scheme_file)?;
    }

    let git = GitTracker::open(&args.path)?;
    let root = git.workdir()?;

    let release = Release::new(&git, &schemes, root, ReleaseOptions::from(&args));
    let report = release.run()?;

    if args.dry_run {
        info!("Dry run finished for version {} ({}); nothing was changed.", report.version, report.tag);
    } else {
        info!("Tagging finished for version {} ({}).", report.version, report.tag);
    }
    Ok(())
}
