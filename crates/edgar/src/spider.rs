use crate::cli::RunArgs;
use colored::Colorize;
use edgar_spider::{Config, Outcome, Pipeline, RequestedTypes};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};

struct Job {
    pipeline: Pipeline,
    feed: String,
    requested: RequestedTypes,
}

fn prepare(args: RunArgs, tui: bool) -> anyhow::Result<Job> {
    let mut config = Config::from_env()?;
    if let Some(folder) = args.folder {
        config = config.with_folder(folder);
    }
    debug!("spider config: {config:?}");

    let requested = match args.types {
        Some(types) => types.into_iter().collect(),
        None => RequestedTypes::all(),
    };

    Ok(Job {
        pipeline: Pipeline::new(config)?.with_tui(tui),
        feed: args.feed,
        requested,
    })
}

/// Run the pipeline once.
pub(crate) async fn run(args: RunArgs, json: bool, tui: bool) -> anyhow::Result<()> {
    let job = prepare(args, tui && !json)?;
    let outcome = job.pipeline.run(&job.feed, &job.requested).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report(&outcome))?);
    } else if tui {
        print_outcome(&outcome);
    }

    match outcome {
        Outcome::Done { .. } => Ok(()),
        Outcome::Failed { stage, error } => {
            Err(anyhow::anyhow!("{stage} stage failed, {}: {error}", error.kind()))
        }
    }
}

/// Run the pipeline on a fixed interval until Ctrl-C. Failed runs are logged and retried on
/// the next tick; local faults end the loop.
pub(crate) async fn watch(args: RunArgs, every: u64, tui: bool) -> anyhow::Result<()> {
    let job = prepare(args, tui)?;
    info!("running the spider every {every}s");
    job.watch(every, tui, tokio::signal::ctrl_c()).await
}

// a run that outlasts the period delays the next tick instead of bursting catch-up runs
fn ticker(every: u64) -> Interval {
    let mut interval = tokio::time::interval(Duration::from_secs(every.max(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

impl Job {
    /// Loop until `shutdown` resolves, which also cancels a run in progress.
    async fn watch<F: Future>(&self, every: u64, tui: bool, shutdown: F) -> anyhow::Result<()> {
        let mut interval = ticker(every);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = interval.tick() => trace!("tick"),
                _ = &mut shutdown => {
                    info!("interrupted; stopping the spider");
                    return Ok(());
                }
            }

            let outcome = tokio::select! {
                outcome = self.pipeline.run(&self.feed, &self.requested) => outcome?,
                _ = &mut shutdown => {
                    warn!("interrupted mid-run; stopping the spider");
                    return Ok(());
                }
            };
            if tui {
                print_outcome(&outcome);
            }
            if let Outcome::Failed { stage, error } = &outcome {
                error!("run failed at the {stage} stage, retrying in {every}s: {error}");
            }
        }
    }
}

fn print_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Done {
            artifact,
            unfetched,
        } => {
            println!(
                "{} {}",
                "saved".green().bold(),
                artifact.file_path.display()
            );
            for link in unfetched {
                println!("{} {link}", "not downloaded".yellow());
            }
        }
        Outcome::Failed { stage, error } => {
            println!(
                "{} at the {stage} stage ({}): {error}",
                "failed".red().bold(),
                error.kind()
            );
        }
    }
}

fn report(outcome: &Outcome) -> serde_json::Value {
    match outcome {
        Outcome::Done {
            artifact,
            unfetched,
        } => serde_json::json!({
            "status": "done",
            "artifact": artifact,
            "unfetched": unfetched,
        }),
        Outcome::Failed { stage, error } => serde_json::json!({
            "status": "failed",
            "stage": stage.to_string(),
            "kind": error.kind(),
            "error": error.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgar_spider::FilingType;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn late_runs_delay_the_next_tick() {
        let interval = ticker(100);
        assert_eq!(interval.missed_tick_behavior(), MissedTickBehavior::Delay);
        assert_eq!(interval.period(), Duration::from_secs(100));
        assert_eq!(ticker(0).period(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn shutdown_cancels_a_run_in_progress() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(20)))
            .mount(&server)
            .await;

        let config = Config::new(dir.path())
            .with_domain_root(&server.uri())
            .unwrap();
        let job = Job {
            pipeline: Pipeline::new(config).unwrap(),
            feed: format!("{}/feed", server.uri()),
            requested: [FilingType::EightK].into_iter().collect(),
        };

        // the first tick fires at once, so the run is in flight when shutdown arrives
        let shutdown = tokio::time::sleep(Duration::from_millis(200));
        let stopped = tokio::time::timeout(
            Duration::from_secs(5),
            job.watch(100, false, shutdown),
        )
        .await;

        assert!(matches!(stopped, Ok(Ok(()))));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }
}
