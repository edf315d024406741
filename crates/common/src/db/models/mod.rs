//! SeaORM entity models
//!
//! Database entities for the ScholarHub catalog

mod conference;
mod dataset;
mod dataset_paper;
mod downloaded_paper;
mod interesting_dataset;
mod interesting_paper;
mod journal;
mod paper;
mod paper_citation;
mod profile;
mod publication;
mod similar_dataset;
mod string_list;
mod user;

pub use string_list::StringList;

pub use dataset::{category_label, UNKNOWN_CATEGORY};

pub use paper::{
    Entity as PaperEntity,
    Model as Paper,
    ActiveModel as PaperActiveModel,
    Column as PaperColumn,
};

pub use paper_citation::{
    Entity as PaperCitationEntity,
    Model as PaperCitation,
    ActiveModel as PaperCitationActiveModel,
    Column as PaperCitationColumn,
};

pub use dataset::{
    Entity as DatasetEntity,
    Model as Dataset,
    ActiveModel as DatasetActiveModel,
    Column as DatasetColumn,
};

pub use dataset_paper::{
    Entity as DatasetPaperEntity,
    Model as DatasetPaper,
    ActiveModel as DatasetPaperActiveModel,
    Column as DatasetPaperColumn,
};

pub use similar_dataset::{
    Entity as SimilarDatasetEntity,
    Model as SimilarDataset,
    ActiveModel as SimilarDatasetActiveModel,
    Column as SimilarDatasetColumn,
};

pub use journal::{
    Entity as JournalEntity,
    Model as Journal,
    ActiveModel as JournalActiveModel,
    Column as JournalColumn,
};

pub use conference::{
    Entity as ConferenceEntity,
    Model as Conference,
    ActiveModel as ConferenceActiveModel,
    Column as ConferenceColumn,
};

pub use user::{
    Entity as UserEntity,
    Model as User,
    ActiveModel as UserActiveModel,
    Column as UserColumn,
};

pub use profile::{
    Entity as ProfileEntity,
    Model as Profile,
    ActiveModel as ProfileActiveModel,
    Column as ProfileColumn,
};

pub use publication::{
    Entity as PublicationEntity,
    Model as Publication,
    ActiveModel as PublicationActiveModel,
    Column as PublicationColumn,
};

pub use interesting_paper::{
    Entity as InterestingPaperEntity,
    Model as InterestingPaper,
    ActiveModel as InterestingPaperActiveModel,
    Column as InterestingPaperColumn,
};

pub use downloaded_paper::{
    Entity as DownloadedPaperEntity,
    Model as DownloadedPaper,
    ActiveModel as DownloadedPaperActiveModel,
    Column as DownloadedPaperColumn,
};

pub use interesting_dataset::{
    Entity as InterestingDatasetEntity,
    Model as InterestingDataset,
    ActiveModel as InterestingDatasetActiveModel,
    Column as InterestingDatasetColumn,
};
