//! Observable mailbox model (spec C10).
//!
//! A single in-memory tree - `root → mailbox → message list → message →
//! body part` - that higher layers (a UI, a sync loop) can hold a stable
//! reference into and be notified when it changes, rather than re-fetching
//! and re-diffing plain [`Folder`](crate::Folder)/[`MessageSummary`]/
//! [`MessageContent`] values on every update.
//!
//! Every node has a [`NodeId`] that stays valid for the node's lifetime -
//! the index the scheduler or a view holds never needs to be re-resolved
//! after a reload, only re-read. Attributes that haven't been fetched yet
//! read as [`Loadable::NotLoaded`] or [`Loadable::Loading`] rather than a
//! default value, so a view can render a skeleton instead of an empty
//! string. Mutations that originate locally (mark read, move, delete) are
//! applied optimistically and can be reverted wholesale if the task that
//! was supposed to confirm them on the server fails.

use std::collections::HashMap;

/// Stable identity for a node in the observable tree.
///
/// Valid for the node's lifetime; reused identities are never issued for a
/// different node (the arena only grows, nodes are tombstoned on removal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

/// The lifecycle state of data that's fetched lazily.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Loadable<T> {
    /// Never requested.
    NotLoaded,
    /// Requested, response not yet arrived.
    Loading,
    /// Available.
    Loaded(T),
}

impl<T> Loadable<T> {
    /// The loaded value, if present.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Loaded(v) => Some(v),
            Self::NotLoaded | Self::Loading => None,
        }
    }

    /// True if a load is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// A role-typed attribute a caller can look up on a node without knowing
/// its concrete Rust field - used by generic views that walk the tree and
/// render "whatever this node has for role X" instead of matching on node
/// kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeRole {
    /// A message's subject line.
    MessageSubject,
    /// A message's IMAP flags.
    MessageFlags,
    /// A body part's MIME content type.
    PartMimeType,
    /// A mailbox's total message count.
    TotalMessageCount,
    /// A mailbox's unread message count.
    UnreadMessageCount,
}

/// The value behind a role-typed attribute lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// Free text (subject, MIME type).
    Text(String),
    /// A flag set.
    Flags(Vec<String>),
    /// A count.
    Count(u32),
}

/// A change to the tree a listener should react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// A node's lazily-loaded data arrived.
    Loaded(NodeId),
    /// A node's attributes changed (e.g. a flag mutation).
    Changed(NodeId),
    /// A node was removed from the tree (expunge).
    Removed(NodeId),
}

#[derive(Debug, Clone)]
struct MailboxNode {
    name: String,
    message_list: NodeId,
    total_count: Loadable<u32>,
    unread_count: Loadable<u32>,
}

#[derive(Debug, Clone)]
struct MessageListNode {
    #[allow(dead_code)]
    mailbox: NodeId,
    messages: Loadable<Vec<NodeId>>,
}

#[derive(Debug, Clone)]
struct MessageNode {
    #[allow(dead_code)]
    list: NodeId,
    uid: u32,
    subject: Loadable<String>,
    flags: Loadable<Vec<String>>,
    deleted: bool,
    body_parts: Loadable<Vec<NodeId>>,
}

#[derive(Debug, Clone)]
struct BodyPartNode {
    #[allow(dead_code)]
    message: NodeId,
    part_number: String,
    mime_type: Loadable<String>,
}

/// A reverted-or-kept optimistic flag mutation.
///
/// Returned by [`ObservableModel::begin_flag_mutation`]; pass it to either
/// [`ObservableModel::commit_mutation`] (the server confirmed it, nothing
/// left to do) or [`ObservableModel::revert_mutation`] (the server rejected
/// it, restore the previous flags).
#[derive(Debug, Clone)]
pub struct PendingFlagMutation {
    node: NodeId,
    previous_flags: Loadable<Vec<String>>,
}

/// The observable mailbox tree.
///
/// One instance models one connection's worth of mailboxes. Mailbox nodes
/// are created explicitly (mirroring a folder list fetch); message lists,
/// messages, and body parts are populated lazily as they're loaded.
#[derive(Debug)]
pub struct ObservableModel {
    next_id: u64,
    root: NodeId,
    mailboxes: HashMap<NodeId, MailboxNode>,
    message_lists: HashMap<NodeId, MessageListNode>,
    messages: HashMap<NodeId, MessageNode>,
    body_parts: HashMap<NodeId, BodyPartNode>,
    mailbox_order: Vec<NodeId>,
    events: Vec<ChangeEvent>,
}

impl Default for ObservableModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ObservableModel {
    /// Creates an empty model with just a root node.
    #[must_use]
    pub fn new() -> Self {
        let mut model = Self {
            next_id: 1,
            root: NodeId(0),
            mailboxes: HashMap::new(),
            message_lists: HashMap::new(),
            messages: HashMap::new(),
            body_parts: HashMap::new(),
            mailbox_order: Vec::new(),
            events: Vec::new(),
        };
        model.root = NodeId(0);
        model
    }

    fn alloc(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// The root node's identity.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Mailbox nodes currently in the tree, in the order they were added.
    #[must_use]
    pub fn mailboxes(&self) -> &[NodeId] {
        &self.mailbox_order
    }

    /// Adds a mailbox to the tree (its message list starts unloaded) and
    /// returns its node id.
    pub fn add_mailbox(&mut self, name: impl Into<String>) -> NodeId {
        let mailbox_id = self.alloc();
        let list_id = self.alloc();
        self.message_lists.insert(
            list_id,
            MessageListNode {
                mailbox: mailbox_id,
                messages: Loadable::NotLoaded,
            },
        );
        self.mailboxes.insert(
            mailbox_id,
            MailboxNode {
                name: name.into(),
                message_list: list_id,
                total_count: Loadable::NotLoaded,
                unread_count: Loadable::NotLoaded,
            },
        );
        self.mailbox_order.push(mailbox_id);
        mailbox_id
    }

    /// The message-list node under a mailbox, if the mailbox exists.
    #[must_use]
    pub fn message_list_of(&self, mailbox: NodeId) -> Option<NodeId> {
        self.mailboxes.get(&mailbox).map(|m| m.message_list)
    }

    /// Marks a mailbox's message list as loading (the caller is about to
    /// issue a `SELECT`/`SEARCH`/sync fetch for it).
    pub fn request_load_message_list(&mut self, list: NodeId) {
        if let Some(node) = self.message_lists.get_mut(&list) {
            node.messages = Loadable::Loading;
        }
    }

    /// Populates a mailbox's message list with freshly fetched UIDs,
    /// creating a message node for each and marking the list loaded.
    /// Emits a [`ChangeEvent::Loaded`] for the list and one for each
    /// message created.
    pub fn set_message_list(&mut self, list: NodeId, uids: Vec<u32>) {
        let mut message_ids = Vec::with_capacity(uids.len());
        for uid in uids {
            let message_id = self.alloc();
            self.messages.insert(
                message_id,
                MessageNode {
                    list,
                    uid,
                    subject: Loadable::NotLoaded,
                    flags: Loadable::NotLoaded,
                    deleted: false,
                    body_parts: Loadable::NotLoaded,
                },
            );
            message_ids.push(message_id);
            self.events.push(ChangeEvent::Loaded(message_id));
        }

        if let Some(node) = self.message_lists.get_mut(&list) {
            node.messages = Loadable::Loaded(message_ids);
        }
        self.events.push(ChangeEvent::Loaded(list));
    }

    /// The message nodes under a list, if loaded.
    #[must_use]
    pub fn messages_of(&self, list: NodeId) -> Option<&[NodeId]> {
        self.message_lists
            .get(&list)
            .and_then(|n| n.messages.value())
            .map(Vec::as_slice)
    }

    /// Sets a message's subject and flags (e.g. from an envelope/flags
    /// fetch) and emits a [`ChangeEvent::Loaded`].
    pub fn set_message_metadata(&mut self, message: NodeId, subject: String, flags: Vec<String>) {
        if let Some(node) = self.messages.get_mut(&message) {
            node.subject = Loadable::Loaded(subject);
            node.flags = Loadable::Loaded(flags);
            self.events.push(ChangeEvent::Loaded(message));
        }
    }

    /// Adds a body part under a message.
    pub fn add_body_part(
        &mut self,
        message: NodeId,
        part_number: impl Into<String>,
        mime_type: Option<String>,
    ) -> Option<NodeId> {
        if !self.messages.contains_key(&message) {
            return None;
        }
        let part_id = self.alloc();
        self.body_parts.insert(
            part_id,
            BodyPartNode {
                message,
                part_number: part_number.into(),
                mime_type: mime_type.map_or(Loadable::NotLoaded, Loadable::Loaded),
            },
        );
        let parts = match self
            .messages
            .get_mut(&message)
            .map(|m| &mut m.body_parts)
        {
            Some(loadable) => loadable,
            None => return None,
        };
        match parts {
            Loadable::Loaded(ids) => ids.push(part_id),
            _ => *parts = Loadable::Loaded(vec![part_id]),
        }
        self.events.push(ChangeEvent::Loaded(part_id));
        Some(part_id)
    }

    /// Role-typed attribute lookup: reads whichever attribute `role` names
    /// off of `node`, regardless of what kind of node it is. Returns `None`
    /// if the node doesn't carry that attribute, or it hasn't loaded yet.
    #[must_use]
    pub fn attribute(&self, node: NodeId, role: AttributeRole) -> Option<AttributeValue> {
        match role {
            AttributeRole::MessageSubject => self
                .messages
                .get(&node)?
                .subject
                .value()
                .cloned()
                .map(AttributeValue::Text),
            AttributeRole::MessageFlags => self
                .messages
                .get(&node)?
                .flags
                .value()
                .cloned()
                .map(AttributeValue::Flags),
            AttributeRole::PartMimeType => self
                .body_parts
                .get(&node)?
                .mime_type
                .value()
                .cloned()
                .map(AttributeValue::Text),
            AttributeRole::TotalMessageCount => self
                .mailboxes
                .get(&node)?
                .total_count
                .value()
                .copied()
                .map(AttributeValue::Count),
            AttributeRole::UnreadMessageCount => self
                .mailboxes
                .get(&node)?
                .unread_count
                .value()
                .copied()
                .map(AttributeValue::Count),
        }
    }

    /// Sets a mailbox's total/unread counts (e.g. from `STATUS`).
    pub fn set_mailbox_counts(&mut self, mailbox: NodeId, total: u32, unread: u32) {
        if let Some(node) = self.mailboxes.get_mut(&mailbox) {
            node.total_count = Loadable::Loaded(total);
            node.unread_count = Loadable::Loaded(unread);
            self.events.push(ChangeEvent::Changed(mailbox));
        }
    }

    /// Forces a mailbox's message list (and everything under it) back to
    /// unloaded, so the next read re-fetches from the server rather than
    /// trusting stale cached data. Used after a re-enumerate sync decision.
    pub fn reload_subtree(&mut self, mailbox: NodeId) {
        let Some(mailbox_node) = self.mailboxes.get(&mailbox) else {
            return;
        };
        let list_id = mailbox_node.message_list;
        let stale_messages: Vec<NodeId> = self
            .message_lists
            .get(&list_id)
            .and_then(|n| n.messages.value())
            .cloned()
            .unwrap_or_default();

        for message_id in stale_messages {
            if let Some(parts) = self
                .messages
                .get(&message_id)
                .and_then(|m| m.body_parts.value())
                .cloned()
            {
                for part_id in parts {
                    self.body_parts.remove(&part_id);
                }
            }
            self.messages.remove(&message_id);
        }

        if let Some(node) = self.message_lists.get_mut(&list_id) {
            node.messages = Loadable::NotLoaded;
        }
        self.events.push(ChangeEvent::Changed(list_id));
    }

    /// Marks a message as deleted (`\Deleted` flag set locally) without
    /// waiting for server confirmation.
    pub fn mark_deleted(&mut self, message: NodeId) {
        if let Some(node) = self.messages.get_mut(&message) {
            node.deleted = true;
            self.events.push(ChangeEvent::Changed(message));
        }
    }

    /// Clears a message's locally-set deleted flag.
    pub fn mark_undeleted(&mut self, message: NodeId) {
        if let Some(node) = self.messages.get_mut(&message) {
            node.deleted = false;
            self.events.push(ChangeEvent::Changed(message));
        }
    }

    /// Whether a message is currently marked deleted.
    #[must_use]
    pub fn is_deleted(&self, message: NodeId) -> bool {
        self.messages.get(&message).is_some_and(|m| m.deleted)
    }

    /// Removes a message (and its body parts) from the tree entirely -
    /// the local effect of an `EXPUNGE`.
    pub fn expunge(&mut self, message: NodeId) {
        let Some(node) = self.messages.remove(&message) else {
            return;
        };
        if let Loadable::Loaded(parts) = node.body_parts {
            for part_id in parts {
                self.body_parts.remove(&part_id);
            }
        }
        for list in self.message_lists.values_mut() {
            if let Loadable::Loaded(ids) = &mut list.messages {
                ids.retain(|id| *id != message);
            }
        }
        self.events.push(ChangeEvent::Removed(message));
    }

    /// The local effect of a successful `COPY`: creates a new message node
    /// under `target_list` carrying the source message's current metadata.
    /// Returns the new node's id, or `None` if the source message or target
    /// list don't exist.
    pub fn copy_message(&mut self, message: NodeId, target_list: NodeId) -> Option<NodeId> {
        let source = self.messages.get(&message)?.clone();
        if !self.message_lists.contains_key(&target_list) {
            return None;
        }
        let new_id = self.alloc();
        self.messages.insert(
            new_id,
            MessageNode {
                list: target_list,
                uid: source.uid,
                subject: source.subject,
                flags: source.flags,
                deleted: false,
                body_parts: Loadable::NotLoaded,
            },
        );
        if let Some(list) = self.message_lists.get_mut(&target_list) {
            match &mut list.messages {
                Loadable::Loaded(ids) => ids.push(new_id),
                other => *other = Loadable::Loaded(vec![new_id]),
            }
        }
        self.events.push(ChangeEvent::Loaded(new_id));
        Some(new_id)
    }

    /// The local effect of a successful `MOVE`: relocates a message node to
    /// a different message list in place, preserving its identity.
    pub fn move_message(&mut self, message: NodeId, target_list: NodeId) -> bool {
        if !self.messages.contains_key(&message) || !self.message_lists.contains_key(&target_list)
        {
            return false;
        }
        for list in self.message_lists.values_mut() {
            if let Loadable::Loaded(ids) = &mut list.messages {
                ids.retain(|id| *id != message);
            }
        }
        if let Some(node) = self.messages.get_mut(&message) {
            node.list = target_list;
        }
        if let Some(list) = self.message_lists.get_mut(&target_list) {
            match &mut list.messages {
                Loadable::Loaded(ids) => ids.push(message),
                other => *other = Loadable::Loaded(vec![message]),
            }
        }
        self.events.push(ChangeEvent::Changed(message));
        true
    }

    /// The local effect of a successful `APPEND`: creates a new message
    /// node under `list` with the given metadata.
    pub fn append_message(
        &mut self,
        list: NodeId,
        uid: u32,
        subject: String,
        flags: Vec<String>,
    ) -> Option<NodeId> {
        if !self.message_lists.contains_key(&list) {
            return None;
        }
        let new_id = self.alloc();
        self.messages.insert(
            new_id,
            MessageNode {
                list,
                uid,
                subject: Loadable::Loaded(subject),
                flags: Loadable::Loaded(flags),
                deleted: false,
                body_parts: Loadable::NotLoaded,
            },
        );
        if let Some(list_node) = self.message_lists.get_mut(&list) {
            match &mut list_node.messages {
                Loadable::Loaded(ids) => ids.push(new_id),
                other => *other = Loadable::Loaded(vec![new_id]),
            }
        }
        self.events.push(ChangeEvent::Loaded(new_id));
        Some(new_id)
    }

    /// Applies a flag change optimistically, before the server has
    /// confirmed it, and returns a handle to either [`commit_mutation`](Self::commit_mutation)
    /// or [`revert_mutation`](Self::revert_mutation) once the task
    /// resolves.
    pub fn begin_flag_mutation(
        &mut self,
        message: NodeId,
        new_flags: Vec<String>,
    ) -> Option<PendingFlagMutation> {
        let node = self.messages.get_mut(&message)?;
        let previous_flags = std::mem::replace(&mut node.flags, Loadable::Loaded(new_flags));
        self.events.push(ChangeEvent::Changed(message));
        Some(PendingFlagMutation {
            node: message,
            previous_flags,
        })
    }

    /// Confirms an optimistic mutation: the server agreed, nothing to undo.
    pub fn commit_mutation(&mut self, _mutation: PendingFlagMutation) {}

    /// Reverts an optimistic mutation: the task that was supposed to
    /// confirm it on the server failed, so the prior flags are restored.
    pub fn revert_mutation(&mut self, mutation: PendingFlagMutation) {
        if let Some(node) = self.messages.get_mut(&mutation.node) {
            node.flags = mutation.previous_flags;
            self.events.push(ChangeEvent::Changed(mutation.node));
        }
    }

    /// Drains every change event accumulated since the last call. A
    /// listener should call this after each round of mutations/loads to
    /// learn what to re-render.
    pub fn take_events(&mut self) -> Vec<ChangeEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn new_mailbox_list_starts_unloaded() {
        let mut model = ObservableModel::new();
        let mailbox = model.add_mailbox("INBOX");
        let list = model.message_list_of(mailbox).unwrap();
        assert!(model.messages_of(list).is_none());
    }

    #[test]
    fn loading_a_message_list_emits_events_per_message() {
        let mut model = ObservableModel::new();
        let mailbox = model.add_mailbox("INBOX");
        let list = model.message_list_of(mailbox).unwrap();

        model.request_load_message_list(list);
        model.set_message_list(list, vec![1, 2, 3]);

        let messages = model.messages_of(list).unwrap();
        assert_eq!(messages.len(), 3);

        let events = model.take_events();
        // 3 message-loaded events plus the list-loaded event.
        assert_eq!(events.len(), 4);
        assert!(events.contains(&ChangeEvent::Loaded(list)));
    }

    #[test]
    fn attribute_lookup_is_none_until_loaded() {
        let mut model = ObservableModel::new();
        let mailbox = model.add_mailbox("INBOX");
        let list = model.message_list_of(mailbox).unwrap();
        model.set_message_list(list, vec![42]);
        let message = model.messages_of(list).unwrap()[0];

        assert!(model.attribute(message, AttributeRole::MessageSubject).is_none());

        model.set_message_metadata(message, "Hello".to_string(), vec!["\\Seen".to_string()]);
        assert_eq!(
            model.attribute(message, AttributeRole::MessageSubject),
            Some(AttributeValue::Text("Hello".to_string()))
        );
        assert_eq!(
            model.attribute(message, AttributeRole::MessageFlags),
            Some(AttributeValue::Flags(vec!["\\Seen".to_string()]))
        );
    }

    #[test]
    fn mailbox_counts_are_role_typed_attributes() {
        let mut model = ObservableModel::new();
        let mailbox = model.add_mailbox("INBOX");
        assert!(
            model
                .attribute(mailbox, AttributeRole::TotalMessageCount)
                .is_none()
        );
        model.set_mailbox_counts(mailbox, 100, 7);
        assert_eq!(
            model.attribute(mailbox, AttributeRole::TotalMessageCount),
            Some(AttributeValue::Count(100))
        );
        assert_eq!(
            model.attribute(mailbox, AttributeRole::UnreadMessageCount),
            Some(AttributeValue::Count(7))
        );
    }

    #[test]
    fn reload_subtree_clears_messages_and_their_parts() {
        let mut model = ObservableModel::new();
        let mailbox = model.add_mailbox("INBOX");
        let list = model.message_list_of(mailbox).unwrap();
        model.set_message_list(list, vec![1]);
        let message = model.messages_of(list).unwrap()[0];
        model.add_body_part(message, "1", Some("text/plain".to_string()));

        model.reload_subtree(mailbox);

        assert!(model.messages_of(list).is_none());
        assert!(model.attribute(message, AttributeRole::MessageSubject).is_none());
    }

    #[test]
    fn mark_deleted_then_undeleted_round_trips() {
        let mut model = ObservableModel::new();
        let mailbox = model.add_mailbox("INBOX");
        let list = model.message_list_of(mailbox).unwrap();
        model.set_message_list(list, vec![1]);
        let message = model.messages_of(list).unwrap()[0];

        assert!(!model.is_deleted(message));
        model.mark_deleted(message);
        assert!(model.is_deleted(message));
        model.mark_undeleted(message);
        assert!(!model.is_deleted(message));
    }

    #[test]
    fn expunge_removes_message_from_its_list() {
        let mut model = ObservableModel::new();
        let mailbox = model.add_mailbox("INBOX");
        let list = model.message_list_of(mailbox).unwrap();
        model.set_message_list(list, vec![1, 2]);
        let messages = model.messages_of(list).unwrap().to_vec();

        model.expunge(messages[0]);
        assert_eq!(model.messages_of(list).unwrap().len(), 1);
        assert!(!model.messages_of(list).unwrap().contains(&messages[0]));
    }

    #[test]
    fn copy_message_creates_an_independent_node_in_the_target_list() {
        let mut model = ObservableModel::new();
        let source_mailbox = model.add_mailbox("INBOX");
        let target_mailbox = model.add_mailbox("Archive");
        let source_list = model.message_list_of(source_mailbox).unwrap();
        let target_list = model.message_list_of(target_mailbox).unwrap();
        model.set_message_list(source_list, vec![1]);
        let message = model.messages_of(source_list).unwrap()[0];
        model.set_message_metadata(message, "Hi".to_string(), vec![]);

        let copied = model.copy_message(message, target_list).unwrap();
        assert_ne!(copied, message);
        assert_eq!(model.messages_of(target_list).unwrap(), &[copied]);
        assert_eq!(
            model.attribute(copied, AttributeRole::MessageSubject),
            Some(AttributeValue::Text("Hi".to_string()))
        );
        // The source message is untouched.
        assert_eq!(model.messages_of(source_list).unwrap(), &[message]);
    }

    #[test]
    fn move_message_relocates_without_changing_identity() {
        let mut model = ObservableModel::new();
        let source_mailbox = model.add_mailbox("INBOX");
        let target_mailbox = model.add_mailbox("Archive");
        let source_list = model.message_list_of(source_mailbox).unwrap();
        let target_list = model.message_list_of(target_mailbox).unwrap();
        model.set_message_list(source_list, vec![1]);
        let message = model.messages_of(source_list).unwrap()[0];

        assert!(model.move_message(message, target_list));
        assert!(model.messages_of(source_list).unwrap().is_empty());
        assert_eq!(model.messages_of(target_list).unwrap(), &[message]);
    }

    #[test]
    fn append_message_adds_a_new_node_with_loaded_metadata() {
        let mut model = ObservableModel::new();
        let mailbox = model.add_mailbox("Drafts");
        let list = model.message_list_of(mailbox).unwrap();

        let appended = model
            .append_message(list, 99, "Draft".to_string(), vec!["\\Draft".to_string()])
            .unwrap();
        assert_eq!(
            model.attribute(appended, AttributeRole::MessageSubject),
            Some(AttributeValue::Text("Draft".to_string()))
        );
    }

    #[test]
    fn optimistic_flag_mutation_reverts_on_failure() {
        let mut model = ObservableModel::new();
        let mailbox = model.add_mailbox("INBOX");
        let list = model.message_list_of(mailbox).unwrap();
        model.set_message_list(list, vec![1]);
        let message = model.messages_of(list).unwrap()[0];
        model.set_message_metadata(message, "Hi".to_string(), vec!["\\Seen".to_string()]);

        let mutation = model
            .begin_flag_mutation(message, vec!["\\Seen".to_string(), "\\Flagged".to_string()])
            .unwrap();
        assert_eq!(
            model.attribute(message, AttributeRole::MessageFlags),
            Some(AttributeValue::Flags(vec![
                "\\Seen".to_string(),
                "\\Flagged".to_string()
            ]))
        );

        model.revert_mutation(mutation);
        assert_eq!(
            model.attribute(message, AttributeRole::MessageFlags),
            Some(AttributeValue::Flags(vec!["\\Seen".to_string()]))
        );
    }

    #[test]
    fn optimistic_flag_mutation_commit_keeps_new_value() {
        let mut model = ObservableModel::new();
        let mailbox = model.add_mailbox("INBOX");
        let list = model.message_list_of(mailbox).unwrap();
        model.set_message_list(list, vec![1]);
        let message = model.messages_of(list).unwrap()[0];
        model.set_message_metadata(message, "Hi".to_string(), vec![]);

        let mutation = model
            .begin_flag_mutation(message, vec!["\\Seen".to_string()])
            .unwrap();
        model.commit_mutation(mutation);
        assert_eq!(
            model.attribute(message, AttributeRole::MessageFlags),
            Some(AttributeValue::Flags(vec!["\\Seen".to_string()]))
        );
    }
}
