//! Broadcast fan-out to all known users
//!
//! The content is whatever the admin sent after /broadcast: plain text, a
//! single attachment with a caption, or a whole media group. Sends go out
//! sequentially with a small throttle; per-recipient failures are counted
//! and never retried.

use teloxide::prelude::*;
use teloxide::types::{
    FileId, InputFile, InputMedia, InputMediaDocument, InputMediaPhoto, InputMediaVideo, Message,
    MessageEntity,
};
use teloxide::RequestError;

use crate::core::{config, metrics};

/// Kind of a re-sendable attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Photo,
    Document,
    Video,
}

/// A file the bot can resend by its Telegram file id
#[derive(Debug, Clone)]
pub struct BroadcastAttachment {
    pub kind: AttachmentKind,
    pub file_id: FileId,
}

/// Everything needed to replay the admin's message to another chat
#[derive(Debug, Clone, Default)]
pub struct BroadcastContent {
    pub caption: String,
    pub caption_entities: Vec<MessageEntity>,
    pub attachments: Vec<BroadcastAttachment>,
}

impl BroadcastContent {
    /// Captures text/caption, formatting entities and the attachment (if
    /// any) of a single non-album message.
    pub fn from_message(msg: &Message) -> Self {
        Self {
            caption: msg
                .caption()
                .or_else(|| msg.text())
                .unwrap_or_default()
                .to_owned(),
            caption_entities: msg
                .caption_entities()
                .or_else(|| msg.entities())
                .map(|e| e.to_vec())
                .unwrap_or_default(),
            attachments: attachment_from_message(msg).into_iter().collect(),
        }
    }
}

/// Picks the single re-sendable attachment out of a message. The largest
/// photo size wins, same as the clients display.
pub fn attachment_from_message(msg: &Message) -> Option<BroadcastAttachment> {
    if let Some(photos) = msg.photo() {
        return photos.last().map(|photo| BroadcastAttachment {
            kind: AttachmentKind::Photo,
            file_id: photo.file.id.clone(),
        });
    }
    if let Some(document) = msg.document() {
        return Some(BroadcastAttachment {
            kind: AttachmentKind::Document,
            file_id: document.file.id.clone(),
        });
    }
    if let Some(video) = msg.video() {
        return Some(BroadcastAttachment {
            kind: AttachmentKind::Video,
            file_id: video.file.id.clone(),
        });
    }
    None
}

/// A media-group part collected while the rest of the album is still
/// arriving
#[derive(Debug, Clone)]
pub struct AlbumPart {
    pub message_id: i32,
    pub attachment: BroadcastAttachment,
    pub caption: Option<String>,
    pub caption_entities: Vec<MessageEntity>,
}

impl AlbumPart {
    pub fn from_message(msg: &Message) -> Option<Self> {
        Some(Self {
            message_id: msg.id.0,
            attachment: attachment_from_message(msg)?,
            caption: msg.caption().map(str::to_owned),
            caption_entities: msg.caption_entities().map(|e| e.to_vec()).unwrap_or_default(),
        })
    }
}

/// Admin chat state between /broadcast and the message that follows it
#[derive(Debug, Default)]
pub struct PendingBroadcast {
    /// Media-group parts buffered until the collection pause elapses
    pub album: Vec<AlbumPart>,
}

impl PendingBroadcast {
    /// Assembles the buffered album into broadcastable content. Parts are
    /// ordered by message id, the caption comes from the first captioned
    /// part.
    pub fn into_content(mut self) -> BroadcastContent {
        self.album.sort_by_key(|part| part.message_id);

        let (caption, caption_entities) = self
            .album
            .iter()
            .find(|part| part.caption.is_some())
            .map(|part| {
                (
                    part.caption.clone().unwrap_or_default(),
                    part.caption_entities.clone(),
                )
            })
            .unwrap_or_default();

        BroadcastContent {
            caption,
            caption_entities,
            attachments: self.album.into_iter().map(|part| part.attachment).collect(),
        }
    }
}

/// Sends the content to every id sequentially, with a fixed delay between
/// sends. Returns `(sent, failed)`; `sent + failed == tg_ids.len()` always.
pub async fn send_broadcast(bot: &Bot, tg_ids: &[i64], content: &BroadcastContent) -> (u32, u32) {
    let mut sent = 0u32;
    let mut failed = 0u32;

    for &tg_id in tg_ids {
        match send_to_recipient(bot, ChatId(tg_id), content).await {
            Ok(()) => {
                sent += 1;
                metrics::BROADCAST_SENT_TOTAL.inc();
            }
            Err(e) => {
                log::warn!("[broadcast] Не удалось отправить пользователю {}: {}", tg_id, e);
                failed += 1;
                metrics::BROADCAST_FAILED_TOTAL.inc();
            }
        }

        tokio::time::sleep(config::broadcast::throttle()).await;
    }

    (sent, failed)
}

async fn send_to_recipient(
    bot: &Bot,
    chat_id: ChatId,
    content: &BroadcastContent,
) -> Result<(), RequestError> {
    match content.attachments.as_slice() {
        [] => {
            let mut req = bot.send_message(chat_id, content.caption.clone());
            if !content.caption_entities.is_empty() {
                req = req.entities(content.caption_entities.clone());
            }
            req.await?;
        }
        [attachment] => {
            send_single_attachment(bot, chat_id, attachment, content).await?;
        }
        attachments => {
            let media: Vec<InputMedia> = attachments
                .iter()
                .enumerate()
                .map(|(idx, attachment)| {
                    // The caption goes on the first item only, the clients
                    // show it under the whole album
                    let (caption, entities) = if idx == 0 {
                        (
                            Some(content.caption.clone()),
                            content.caption_entities.clone(),
                        )
                    } else {
                        (None, Vec::new())
                    };
                    input_media(attachment, caption, entities)
                })
                .collect();

            bot.send_media_group(chat_id, media).await?;
        }
    }

    Ok(())
}

async fn send_single_attachment(
    bot: &Bot,
    chat_id: ChatId,
    attachment: &BroadcastAttachment,
    content: &BroadcastContent,
) -> Result<(), RequestError> {
    let file = InputFile::file_id(attachment.file_id.clone());
    let caption = (!content.caption.is_empty()).then(|| content.caption.clone());
    let entities = content.caption_entities.clone();

    match attachment.kind {
        AttachmentKind::Photo => {
            let mut req = bot.send_photo(chat_id, file);
            if let Some(caption) = caption {
                req = req.caption(caption);
            }
            if !entities.is_empty() {
                req = req.caption_entities(entities);
            }
            req.await?;
        }
        AttachmentKind::Document => {
            let mut req = bot.send_document(chat_id, file);
            if let Some(caption) = caption {
                req = req.caption(caption);
            }
            if !entities.is_empty() {
                req = req.caption_entities(entities);
            }
            req.await?;
        }
        AttachmentKind::Video => {
            let mut req = bot.send_video(chat_id, file);
            if let Some(caption) = caption {
                req = req.caption(caption);
            }
            if !entities.is_empty() {
                req = req.caption_entities(entities);
            }
            req.await?;
        }
    }

    Ok(())
}

fn input_media(
    attachment: &BroadcastAttachment,
    caption: Option<String>,
    entities: Vec<MessageEntity>,
) -> InputMedia {
    let file = InputFile::file_id(attachment.file_id.clone());

    match attachment.kind {
        AttachmentKind::Photo => {
            let mut media = InputMediaPhoto::new(file);
            if let Some(caption) = caption {
                media = media.caption(caption);
            }
            if !entities.is_empty() {
                media = media.caption_entities(entities);
            }
            InputMedia::Photo(media)
        }
        AttachmentKind::Document => {
            let mut media = InputMediaDocument::new(file);
            if let Some(caption) = caption {
                media = media.caption(caption);
            }
            if !entities.is_empty() {
                media = media.caption_entities(entities);
            }
            InputMedia::Document(media)
        }
        AttachmentKind::Video => {
            let mut media = InputMediaVideo::new(file);
            if let Some(caption) = caption {
                media = media.caption(caption);
            }
            if !entities.is_empty() {
                media = media.caption_entities(entities);
            }
            InputMedia::Video(media)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(message_id: i32, caption: Option<&str>) -> AlbumPart {
        AlbumPart {
            message_id,
            attachment: BroadcastAttachment {
                kind: AttachmentKind::Photo,
                file_id: FileId(format!("file-{message_id}")),
            },
            caption: caption.map(str::to_owned),
            caption_entities: Vec::new(),
        }
    }

    #[test]
    fn album_parts_are_ordered_by_message_id() {
        let pending = PendingBroadcast {
            album: vec![part(7, None), part(3, Some("подпись")), part(5, None)],
        };

        let content = pending.into_content();

        assert_eq!(content.attachments.len(), 3);
        assert_eq!(content.attachments[0].file_id.0, "file-3");
        assert_eq!(content.attachments[2].file_id.0, "file-7");
        assert_eq!(content.caption, "подпись");
    }

    #[test]
    fn album_without_captions_broadcasts_empty_caption() {
        let pending = PendingBroadcast {
            album: vec![part(1, None), part(2, None)],
        };

        let content = pending.into_content();
        assert!(content.caption.is_empty());
    }
}
