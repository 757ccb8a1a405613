//! Document gallery: upload, conversion, selection and deletion.

pub mod convert;
mod gallery;
mod upload;

pub use convert::{DecodeError, FormatRegistry};
pub use gallery::{
    ActiveDocument, DocumentBody, DocumentId, DocumentKind, Gallery, GalleryItem, GalleryWindow,
    PageImage,
};
pub use upload::{DeleteDocumentRequest, OpenDocumentRequest, UploadRequest, UploadStatus};

use bevy::prelude::*;

pub struct DocumentsPlugin;

impl Plugin for DocumentsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Gallery>()
            .init_resource::<ActiveDocument>()
            .init_resource::<GalleryWindow>()
            .init_resource::<UploadStatus>()
            .init_resource::<FormatRegistry>()
            .add_message::<UploadRequest>()
            .add_message::<OpenDocumentRequest>()
            .add_message::<DeleteDocumentRequest>()
            .add_systems(
                Update,
                (
                    upload::handle_dropped_files,
                    upload::start_uploads,
                    upload::poll_conversion_tasks,
                    upload::open_document_system.run_if(on_message::<OpenDocumentRequest>),
                    upload::delete_document_system.run_if(on_message::<DeleteDocumentRequest>),
                    upload::auto_open_gallery,
                )
                    .chain(),
            );
    }
}
