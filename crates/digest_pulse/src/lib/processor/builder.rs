use digest_datastore::DataStore;

use crate::{
    config::PipelineConfig,
    yt::{TranscriptFetcher, VideoSource},
    IngestionPipeline, Summarizer,
};

pub struct IngestionPipelineBuilder<D = (), V = (), T = (), S = ()> {
    config: PipelineConfig,
    store: D,
    video_source: V,
    transcript_fetcher: T,
    summarizer: S,
}

impl IngestionPipelineBuilder {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            store: (),
            video_source: (),
            transcript_fetcher: (),
            summarizer: (),
        }
    }
}

impl<D, V, T, S> IngestionPipelineBuilder<D, V, T, S> {
    pub fn store<D2: DataStore + Send + Sync + 'static>(
        self,
        store: D2,
    ) -> IngestionPipelineBuilder<D2, V, T, S> {
        IngestionPipelineBuilder {
            config: self.config,
            store,
            video_source: self.video_source,
            transcript_fetcher: self.transcript_fetcher,
            summarizer: self.summarizer,
        }
    }

    pub fn video_source<V2: VideoSource + Send + Sync + 'static>(
        self,
        video_source: V2,
    ) -> IngestionPipelineBuilder<D, V2, T, S> {
        IngestionPipelineBuilder {
            config: self.config,
            store: self.store,
            video_source,
            transcript_fetcher: self.transcript_fetcher,
            summarizer: self.summarizer,
        }
    }

    pub fn transcript_fetcher<T2: TranscriptFetcher + Send + Sync + 'static>(
        self,
        transcript_fetcher: T2,
    ) -> IngestionPipelineBuilder<D, V, T2, S> {
        IngestionPipelineBuilder {
            config: self.config,
            store: self.store,
            video_source: self.video_source,
            transcript_fetcher,
            summarizer: self.summarizer,
        }
    }

    pub fn summarizer<S2: Summarizer + Send + Sync + 'static>(
        self,
        summarizer: S2,
    ) -> IngestionPipelineBuilder<D, V, T, S2> {
        IngestionPipelineBuilder {
            config: self.config,
            store: self.store,
            video_source: self.video_source,
            transcript_fetcher: self.transcript_fetcher,
            summarizer,
        }
    }
}

impl<D, V, T, S> IngestionPipelineBuilder<D, V, T, S>
where
    D: DataStore + Send + Sync + 'static,
    V: VideoSource + Send + Sync + 'static,
    T: TranscriptFetcher + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
{
    pub fn build(self) -> IngestionPipeline<D, V, T, S> {
        IngestionPipeline {
            config: self.config,
            store: self.store,
            video_source: self.video_source,
            transcript_fetcher: self.transcript_fetcher,
            summarizer: self.summarizer,
        }
    }
}
