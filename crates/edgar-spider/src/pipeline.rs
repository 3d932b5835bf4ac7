use crate::client::Client;
use crate::config::Config;
use crate::download::{download, DownloadArtifact};
use crate::error::{Result, SpiderError};
use crate::feed::fetch_feed;
use crate::filing::{match_filing, RequestedTypes};
use crate::fs::FileNamer;
use crate::locate::locate;
use crate::tui;
use indicatif::ProgressBar;
use std::fmt;
use tracing::{debug, error, info, warn};

/// The step a pipeline run is working on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Fetching,
    Matching,
    Locating,
    Downloading,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Fetching => "fetch",
            Stage::Matching => "match",
            Stage::Locating => "locate",
            Stage::Downloading => "download",
        })
    }
}

/// How a run ended.
#[derive(Debug)]
pub enum Outcome {
    /// The first located document was saved. `unfetched` holds any further filing links the
    /// index page listed; they are recorded in the link-list file but not downloaded.
    Done {
        artifact: DownloadArtifact,
        unfetched: Vec<String>,
    },

    /// A stage failed and nothing after it ran.
    Failed { stage: Stage, error: SpiderError },
}

impl Outcome {
    pub fn artifact(&self) -> Option<&DownloadArtifact> {
        match self {
            Outcome::Done { artifact, .. } => Some(artifact),
            Outcome::Failed { .. } => None,
        }
    }
}

/// Fetch -> match -> locate -> download, one stage after another.
#[derive(Clone, Debug)]
pub struct Pipeline {
    client: Client,
    config: Config,
    tui: bool,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self> {
        let client = Client::new(&config)?;
        Ok(Self {
            client,
            config,
            tui: false,
        })
    }

    /// Show a spinner on stdout while running.
    pub fn with_tui(mut self, tui: bool) -> Self {
        self.tui = tui;
        self
    }

    /// Run every stage once for `feed_url`.
    ///
    /// Expected failures (blocked, empty feed, no match, no filings, bad status, network) come
    /// back as [`Outcome::Failed`]; local I/O and configuration faults are returned as `Err`.
    /// Nothing is retried.
    pub async fn run(&self, feed_url: &str, requested: &RequestedTypes) -> Result<Outcome> {
        let time = std::time::Instant::now();
        if self.tui {
            tui::banner(&format!("EDGAR {requested}"));
        }

        let pb = tui::stage_spinner(self.tui);
        let mut stage = Stage::Fetching;
        let result = self.stages(feed_url, requested, &mut stage, &pb).await;
        pb.finish_and_clear();

        match result {
            Ok((artifact, unfetched)) => {
                info!(
                    "pipeline done, {:?} saved from {}, time elapsed: {:?}",
                    artifact.file_path,
                    artifact.source_url,
                    time.elapsed()
                );
                Ok(Outcome::Done {
                    artifact,
                    unfetched,
                })
            }
            Err(err) if err.is_fault() => {
                error!("{stage} stage aborted, {}: {err}", err.kind());
                Err(err)
            }
            Err(err) => {
                error!("{stage} stage failed, {}: {err}", err.kind());
                Ok(Outcome::Failed { stage, error: err })
            }
        }
    }

    async fn stages(
        &self,
        feed_url: &str,
        requested: &RequestedTypes,
        stage: &mut Stage,
        pb: &ProgressBar,
    ) -> Result<(DownloadArtifact, Vec<String>)> {
        // every run shares one identifier across the files it writes
        let namer = FileNamer::new(self.config.naming);
        debug!("pipeline run {} started for {feed_url}", namer.run_id());

        *stage = Stage::Fetching;
        pb.set_message(format!("fetching {feed_url} ..."));
        let entries = fetch_feed(&self.client, feed_url).await?;

        *stage = Stage::Matching;
        pb.set_message("matching filings ...");
        let link = match_filing(&entries, requested)?;

        *stage = Stage::Locating;
        pb.set_message(format!("locating {link} ..."));
        let located = locate(&self.client, &self.config, &namer, link).await?;

        let unfetched = located.remaining().to_vec();
        if !unfetched.is_empty() {
            warn!(
                "only the first of {} located filings is downloaded; the rest are listed in {:?}",
                unfetched.len() + 1,
                located.path()
            );
        }

        *stage = Stage::Downloading;
        pb.set_message(format!("downloading {} ...", located.first_url()));
        let artifact = download(&self.client, &self.config, &namer, located.first_url()).await?;

        Ok((artifact, unfetched))
    }
}
