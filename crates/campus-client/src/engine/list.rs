use campus_shared::types::EntityId;

use super::{Change, Entity, Mutation, MutationState, Patch, Settled};

/// An ordered, server-mirrored collection with optimistic edits.
#[derive(Debug, Clone)]
pub struct OptimisticList<T> {
    items: Vec<T>,
}

impl<T> Default for OptimisticList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Entity> OptimisticList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn position(&self, id: &EntityId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    pub fn get(&self, id: &EntityId) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.position(id).is_some()
    }

    pub fn provisional_count(&self) -> usize {
        self.items.iter().filter(|i| i.id().is_provisional()).count()
    }

    /// Replace the whole list with a fresh server page.
    pub fn replace_all(&mut self, items: Vec<T>) {
        self.items = items;
    }

    /// Append a further page, skipping records already present.
    pub fn extend_page(&mut self, items: Vec<T>) -> usize {
        let before = self.items.len();
        for item in items {
            if !self.contains(item.id()) {
                self.items.push(item);
            }
        }
        self.items.len() - before
    }

    /// Mutate a record outside the mutation protocol, e.g. to mirror a
    /// server-side counter. Returns whether the record was found.
    pub fn modify(&mut self, id: &EntityId, f: impl FnOnce(&mut T)) -> bool {
        match self.items.iter_mut().find(|item| item.id() == id) {
            Some(item) => {
                f(item);
                true
            }
            None => false,
        }
    }

    // -- Idle -> Pending ----------------------------------------------------

    /// Prepend a provisional record. A record whose id is not provisional
    /// is given a fresh provisional id first.
    pub fn begin_create(&mut self, mut entity: T) -> Mutation<T> {
        if !entity.id().is_provisional() {
            entity.set_id(EntityId::provisional());
        }
        let temp_id = entity.id().clone();
        self.items.insert(0, entity);
        Mutation::pending(Change::Create { temp_id })
    }

    /// Apply `edit` to a copy of the record and swap it in place.
    pub fn begin_update(&mut self, id: &EntityId, edit: impl FnOnce(&mut T)) -> Option<Mutation<T>> {
        let pos = self.position(id)?;
        let previous = self.items[pos].clone();
        let mut updated = previous.clone();
        edit(&mut updated);
        updated.set_id(id.clone());
        self.items[pos] = updated;
        Some(Mutation::pending(Change::Replace {
            id: id.clone(),
            previous,
        }))
    }

    pub fn begin_remove(&mut self, id: &EntityId) -> Option<Mutation<T>> {
        let index = self.position(id)?;
        let removed = self.items.remove(index);
        Some(Mutation::pending(Change::Remove { index, removed }))
    }

    pub fn begin_patch(&mut self, id: &EntityId, patch: Patch<T>) -> Option<Mutation<T>> {
        let pos = self.position(id)?;
        (patch.apply)(&mut self.items[pos]);
        Some(Mutation::pending(Change::Patch {
            id: id.clone(),
            patch,
        }))
    }

    // -- Pending -> Confirmed -----------------------------------------------

    /// Reconcile with the server's answer. Settling a mutation that is no
    /// longer pending does nothing.
    pub fn confirm(&mut self, mutation: &mut Mutation<T>, server: Option<T>) -> Settled {
        if !mutation.is_pending() {
            return Settled::Confirmed;
        }
        mutation.state = MutationState::Confirmed;

        match (&mutation.change, server) {
            (Change::Create { temp_id }, Some(server)) => {
                self.reconcile_create(temp_id, server);
                Settled::Confirmed
            }
            (Change::Create { temp_id }, None) => {
                self.remove_by_id(temp_id);
                Settled::NeedsRefetch
            }
            (Change::Replace { id, .. } | Change::Patch { id, .. }, Some(server)) => {
                if let Some(pos) = self.position(id) {
                    self.items[pos] = server;
                    self.dedupe_from(pos);
                } else {
                    self.upsert(server);
                }
                Settled::Confirmed
            }
            (Change::Replace { .. } | Change::Patch { .. }, None) => Settled::Confirmed,
            (Change::Remove { .. }, _) => Settled::Confirmed,
        }
    }

    fn reconcile_create(&mut self, temp_id: &EntityId, server: T) {
        match self.position(temp_id) {
            Some(temp_pos) => {
                let duplicate = self
                    .items
                    .iter()
                    .enumerate()
                    .position(|(i, item)| i != temp_pos && item.id() == server.id());
                match duplicate {
                    Some(_) => {
                        self.items.remove(temp_pos);
                        self.upsert(server);
                    }
                    None => self.items[temp_pos] = server,
                }
            }
            None => self.upsert(server),
        }
    }

    /// Replace by id, or prepend when absent.
    fn upsert(&mut self, server: T) {
        match self.position(server.id()) {
            Some(pos) => self.items[pos] = server,
            None => self.items.insert(0, server),
        }
    }

    /// Drop any later entry sharing the id of the entry at `pos`.
    fn dedupe_from(&mut self, pos: usize) {
        let id = self.items[pos].id().clone();
        let mut i = 0;
        self.items.retain(|item| {
            let keep = i == pos || item.id() != &id;
            i += 1;
            keep
        });
    }

    fn remove_by_id(&mut self, id: &EntityId) -> Option<T> {
        let pos = self.position(id)?;
        Some(self.items.remove(pos))
    }

    // -- Pending -> RolledBack ----------------------------------------------

    /// Reverse exactly what going pending did. Settling a mutation that is
    /// no longer pending does nothing.
    pub fn rollback(&mut self, mutation: &mut Mutation<T>) {
        if !mutation.is_pending() {
            return;
        }
        mutation.state = MutationState::RolledBack;

        match &mutation.change {
            Change::Create { temp_id } => {
                self.remove_by_id(temp_id);
            }
            Change::Replace { id, previous } => {
                if let Some(pos) = self.position(id) {
                    self.items[pos] = previous.clone();
                }
            }
            Change::Remove { index, removed } => {
                if !self.contains(removed.id()) {
                    let at = (*index).min(self.items.len());
                    self.items.insert(at, removed.clone());
                }
            }
            Change::Patch { id, patch } => {
                if let Some(pos) = self.position(id) {
                    (patch.undo)(&mut self.items[pos]);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_shared::models::{Author, Comment, CommentDraft, Post, PostDraft};

    fn post(id: &str, likes: i64) -> Post {
        let mut p = PostDraft {
            title: format!("Post {id}"),
            content: "body".into(),
            ..Default::default()
        }
        .to_provisional(Author::default());
        p.id = EntityId::from(id);
        p.like_count = likes;
        p
    }

    fn list(ids: &[&str]) -> OptimisticList<Post> {
        OptimisticList::from_vec(ids.iter().map(|id| post(id, 0)).collect())
    }

    fn ids(list: &OptimisticList<Post>) -> Vec<&str> {
        list.items().iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn create_prepends_provisional_then_confirms_in_place() {
        let mut posts = list(&["p1", "p2"]);
        let mut m = posts.begin_create(post("ignored", 0));
        let temp = m.temp_id().cloned().unwrap();

        assert!(temp.is_provisional());
        assert_eq!(posts.items()[0].id, temp);
        assert_eq!(m.state(), MutationState::Pending);

        let settled = posts.confirm(&mut m, Some(post("p3", 0)));
        assert_eq!(settled, Settled::Confirmed);
        assert_eq!(m.state(), MutationState::Confirmed);
        assert_eq!(ids(&posts), vec!["p3", "p1", "p2"]);
        assert_eq!(posts.provisional_count(), 0);
    }

    #[test]
    fn confirmation_of_an_already_present_id_does_not_duplicate() {
        // A refetch landed the server copy before the create response.
        let mut posts = list(&["p1"]);
        let mut m = posts.begin_create(post("x", 0));
        posts.items.push(post("p9", 0));

        posts.confirm(&mut m, Some(post("p9", 5)));

        assert_eq!(ids(&posts), vec!["p1", "p9"]);
        assert_eq!(posts.get(&"p9".into()).unwrap().like_count, 5);
        assert_eq!(posts.provisional_count(), 0);
    }

    #[test]
    fn confirmation_after_provisional_vanished_upserts() {
        let mut posts = list(&["p1"]);
        let mut m = posts.begin_create(post("x", 0));
        posts.replace_all(vec![post("p1", 0)]);

        posts.confirm(&mut m, Some(post("p2", 0)));
        assert_eq!(ids(&posts), vec!["p2", "p1"]);
    }

    #[test]
    fn confirmation_without_entity_requests_refetch() {
        let mut posts = list(&["p1"]);
        let mut m = posts.begin_create(post("x", 0));

        assert_eq!(posts.confirm(&mut m, None), Settled::NeedsRefetch);
        assert_eq!(ids(&posts), vec!["p1"]);
    }

    #[test]
    fn repeated_confirmation_is_idempotent() {
        let mut posts = list(&["p1", "p2"]);
        let mut m = posts.begin_update(&"p1".into(), |p| p.title = "edited".into()).unwrap();
        let server = {
            let mut p = post("p1", 0);
            p.title = "edited on server".into();
            p
        };

        posts.confirm(&mut m, Some(server.clone()));
        let once = posts.items().to_vec();

        // A second confirmation of the same id replaces again, never appends.
        let mut again = posts.begin_update(&"p1".into(), |_| {}).unwrap();
        posts.confirm(&mut again, Some(server));
        assert_eq!(posts.items(), once.as_slice());
        assert_eq!(posts.len(), 2);
    }

    #[test]
    fn settling_twice_has_no_effect() {
        let mut posts = list(&["p1", "p2"]);
        let mut m = posts.begin_remove(&"p1".into()).unwrap();
        posts.rollback(&mut m);
        assert_eq!(ids(&posts), vec!["p1", "p2"]);

        posts.rollback(&mut m);
        posts.confirm(&mut m, None);
        assert_eq!(ids(&posts), vec!["p1", "p2"]);
        assert_eq!(m.state(), MutationState::RolledBack);
    }

    #[test]
    fn rollback_restores_exact_state() {
        let original = list(&["p1", "p2", "p3"]);

        let mut posts = original.clone();
        let mut create = posts.begin_create(post("x", 0));
        posts.rollback(&mut create);
        assert_eq!(posts.items(), original.items());

        let mut update = posts
            .begin_update(&"p2".into(), |p| p.content = "changed".into())
            .unwrap();
        posts.rollback(&mut update);
        assert_eq!(posts.items(), original.items());

        let mut remove = posts.begin_remove(&"p2".into()).unwrap();
        assert_eq!(ids(&posts), vec!["p1", "p3"]);
        posts.rollback(&mut remove);
        assert_eq!(posts.items(), original.items());

        let mut like = posts
            .begin_patch(&"p3".into(), Patch::toggle(Post::toggle_like))
            .unwrap();
        assert!(posts.get(&"p3".into()).unwrap().is_liked);
        posts.rollback(&mut like);
        assert_eq!(posts.items(), original.items());
    }

    #[test]
    fn removed_index_is_clamped_on_rollback() {
        let mut posts = list(&["p1", "p2", "p3"]);
        let mut m = posts.begin_remove(&"p3".into()).unwrap();
        posts.replace_all(vec![post("p1", 0)]);

        posts.rollback(&mut m);
        assert_eq!(ids(&posts), vec!["p1", "p3"]);
    }

    #[test]
    fn overlapping_toggles_settle_independently() {
        let mut posts = OptimisticList::from_vec(vec![post("p1", 3)]);
        let id = EntityId::from("p1");

        let mut first = posts.begin_patch(&id, Patch::toggle(Post::toggle_like)).unwrap();
        let mut second = posts.begin_patch(&id, Patch::toggle(Post::toggle_like)).unwrap();
        let p = posts.get(&id).unwrap();
        assert_eq!((p.like_count, p.is_liked), (3, false));

        // The second request fails: its flip is undone on its own.
        posts.rollback(&mut second);
        let p = posts.get(&id).unwrap();
        assert_eq!((p.like_count, p.is_liked), (4, true));

        posts.confirm(&mut first, None);
        let p = posts.get(&id).unwrap();
        assert_eq!((p.like_count, p.is_liked), (4, true));
    }

    #[test]
    fn creates_confirmed_out_of_order_each_land_once() {
        let mut posts = list(&["p1"]);
        let mut pending: Vec<_> = (0..5).map(|i| posts.begin_create(post(&format!("tmp{i}"), 0))).collect();
        assert_eq!(posts.provisional_count(), 5);

        for (i, m) in pending.iter_mut().enumerate().rev() {
            posts.confirm(m, Some(post(&format!("s{i}"), 0)));
        }

        assert_eq!(posts.len(), 6);
        assert_eq!(posts.provisional_count(), 0);
        assert_eq!(ids(&posts), vec!["s4", "s3", "s2", "s1", "s0", "p1"]);
    }

    #[test]
    fn stale_comment_unlike_rolls_back_to_the_prior_copy() {
        let mut stale = CommentDraft {
            content: "Nice".into(),
            ..Default::default()
        }
        .to_provisional(&EntityId::from("p1"), Author::default());
        stale.id = EntityId::from("c1");
        stale.is_liked = true;
        let before = stale.clone();
        let mut comments = OptimisticList::from_vec(vec![stale]);
        let id = EntityId::from("c1");

        let mut m = comments.begin_update(&id, Comment::toggle_like).unwrap();
        let c = comments.get(&id).unwrap();
        assert_eq!((c.like_count, c.is_liked), (0, false));

        comments.rollback(&mut m);
        assert_eq!(comments.get(&id), Some(&before));
    }

    #[test]
    fn extend_page_skips_known_ids() {
        let mut posts = list(&["p1", "p2"]);
        let added = posts.extend_page(vec![post("p2", 0), post("p3", 0)]);
        assert_eq!(added, 1);
        assert_eq!(ids(&posts), vec!["p1", "p2", "p3"]);
    }

    #[test]
    fn comments_use_the_same_engine() {
        let post_id = EntityId::from("p1");
        let mut comments: OptimisticList<Comment> = OptimisticList::new();
        let draft = CommentDraft {
            content: "Nice".into(),
            ..Default::default()
        };
        let mut m = comments.begin_create(draft.to_provisional(&post_id, Author::default()));
        assert_eq!(comments.provisional_count(), 1);

        let mut confirmed = draft.to_provisional(&post_id, Author::default());
        confirmed.id = EntityId::from("c1");
        comments.confirm(&mut m, Some(confirmed));
        assert_eq!(comments.items()[0].id, EntityId::from("c1"));
    }
}
