//! In-memory implementation of the Store trait.
//!
//! Primarily for testing. Same semantics as SQLite, no persistence. The
//! single RwLock gives each operation the same atomicity the SQLite backend
//! gets from its transactions.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use foodtoken_core::{
    normalize, EntryId, FoodPreference, IdentityKey, LedgerEntry, Token, TokenState,
};

use crate::error::Result;
use crate::traits::{
    DuplicateGroup, InsertOutcome, LedgerStats, NewEntry, RedeemKey, RedeemOutcome,
    RedemptionEvent, Store,
};

/// In-memory store implementation. All data is lost on drop.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

struct MemoryStoreInner {
    /// Entries by surrogate id, iterated in id order.
    entries: BTreeMap<EntryId, LedgerEntry>,
    /// Audit trail in insertion order.
    redemptions: Vec<RedemptionEvent>,
    /// Next surrogate id.
    next_id: i64,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner {
                entries: BTreeMap::new(),
                redemptions: Vec::new(),
                next_id: 1,
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStoreInner {
    fn find_by_key(&self, key: &RedeemKey) -> Option<EntryId> {
        match key {
            RedeemKey::Token(token) => self
                .entries
                .values()
                .find(|e| e.token == *token)
                .map(|e| e.id),
            RedeemKey::Usn(usn) => {
                let usn_norm = normalize::fold(usn);
                // An empty key must not match entries without an
                // enrollment id.
                if usn_norm.is_empty() {
                    return None;
                }
                self.entries
                    .values()
                    .find(|e| normalize::fold(&e.usn) == usn_norm)
                    .map(|e| e.id)
            }
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_entry(&self, entry: &NewEntry) -> Result<InsertOutcome> {
        let mut inner = self.inner.write().unwrap();

        let key = IdentityKey::from_parts(
            normalize::fold(&entry.email),
            normalize::fold(&entry.usn),
        );

        if let Some(existing) = inner
            .entries
            .values()
            .find(|e| e.identity_key().collides(&key))
        {
            return Ok(InsertOutcome::DuplicateIdentity {
                existing: existing.id,
            });
        }

        let id = EntryId(inner.next_id);
        inner.next_id += 1;

        let row = LedgerEntry {
            id,
            name: entry.name.clone(),
            email: entry.email.clone(),
            usn: entry.usn.clone(),
            class_name: entry.class_name.clone(),
            food_preference: entry.food_preference,
            token: entry.token,
            credential_path: None,
            state: TokenState::Issued,
            redeemed_at: None,
            created_at: entry.created_at,
        };
        inner.entries.insert(id, row.clone());

        Ok(InsertOutcome::Inserted(row))
    }

    async fn get_entry(&self, id: EntryId) -> Result<Option<LedgerEntry>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.entries.get(&id).cloned())
    }

    async fn get_by_token(&self, token: &Token) -> Result<Option<LedgerEntry>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.entries.values().find(|e| e.token == *token).cloned())
    }

    async fn get_by_usn(&self, usn: &str) -> Result<Option<LedgerEntry>> {
        let usn_norm = normalize::fold(usn);
        if usn_norm.is_empty() {
            return Ok(None);
        }
        let inner = self.inner.read().unwrap();
        Ok(inner
            .entries
            .values()
            .find(|e| normalize::fold(&e.usn) == usn_norm)
            .cloned())
    }

    async fn list_entries(&self) -> Result<Vec<LedgerEntry>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.entries.values().cloned().collect())
    }

    async fn identity_keys(&self) -> Result<Vec<IdentityKey>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.entries.values().map(|e| e.identity_key()).collect())
    }

    async fn stats(&self) -> Result<LedgerStats> {
        let inner = self.inner.read().unwrap();
        let mut stats = LedgerStats::default();
        for entry in inner.entries.values() {
            stats.total += 1;
            let redeemed = entry.is_redeemed();
            if redeemed {
                stats.redeemed += 1;
            } else {
                stats.issued += 1;
            }
            match entry.food_preference {
                FoodPreference::Veg => {
                    stats.veg += 1;
                    if redeemed {
                        stats.veg_redeemed += 1;
                    }
                }
                FoodPreference::NonVeg => {
                    stats.non_veg += 1;
                    if redeemed {
                        stats.non_veg_redeemed += 1;
                    }
                }
            }
        }
        Ok(stats)
    }

    async fn redeem(
        &self,
        key: &RedeemKey,
        redeemed_at: i64,
        scanner_info: &str,
    ) -> Result<RedeemOutcome> {
        let mut inner = self.inner.write().unwrap();

        let Some(id) = inner.find_by_key(key) else {
            return Ok(RedeemOutcome::NotFound);
        };

        let entry = inner.entries.get_mut(&id).unwrap();
        if entry.is_redeemed() {
            return Ok(RedeemOutcome::AlreadyRedeemed(entry.clone()));
        }

        entry.state = TokenState::Redeemed;
        entry.redeemed_at = Some(redeemed_at);
        let redeemed = entry.clone();

        inner.redemptions.push(RedemptionEvent {
            entry_id: id,
            redeemed_at,
            scanner_info: scanner_info.to_string(),
        });

        Ok(RedeemOutcome::Redeemed(redeemed))
    }

    async fn list_redemptions(&self, entry_id: Option<EntryId>) -> Result<Vec<RedemptionEvent>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .redemptions
            .iter()
            .filter(|e| entry_id.map_or(true, |id| e.entry_id == id))
            .cloned()
            .collect())
    }

    async fn set_credential_path(&self, id: EntryId, path: &str) -> Result<bool> {
        let mut inner = self.inner.write().unwrap();
        match inner.entries.get_mut(&id) {
            Some(entry) => {
                entry.credential_path = Some(path.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn duplicate_groups(&self) -> Result<Vec<DuplicateGroup>> {
        let inner = self.inner.read().unwrap();
        let mut by_pair: BTreeMap<(String, String), Vec<EntryId>> = BTreeMap::new();
        for entry in inner.entries.values() {
            by_pair
                .entry((entry.name.clone(), entry.email.clone()))
                .or_default()
                .push(entry.id);
        }
        Ok(by_pair
            .into_iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|((name, email), ids)| DuplicateGroup { name, email, ids })
            .collect())
    }

    async fn delete_entries(&self, ids: &[EntryId]) -> Result<usize> {
        let mut inner = self.inner.write().unwrap();
        let mut removed = 0;
        for id in ids {
            if inner.entries.remove(id).is_some() {
                removed += 1;
            }
            inner.redemptions.retain(|e| e.entry_id != *id);
        }
        Ok(removed)
    }

    async fn clear_all(&self) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.entries.clear();
        inner.redemptions.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_entry(name: &str, email: &str, usn: &str) -> NewEntry {
        NewEntry {
            name: name.to_string(),
            email: email.to_string(),
            usn: usn.to_string(),
            class_name: "7DS".to_string(),
            food_preference: FoodPreference::Veg,
            token: Token::generate(),
            created_at: 0,
        }
    }

    #[tokio::test]
    async fn memory_matches_sqlite_semantics() {
        let store = MemoryStore::new();

        let first = match store.insert_entry(&new_entry("A", "a@x.in", "U1")).await.unwrap() {
            InsertOutcome::Inserted(e) => e,
            other => panic!("expected Inserted, got {:?}", other),
        };

        // USN collides even with a fresh email.
        let dup = store
            .insert_entry(&new_entry("B", "b@x.in", " u1 "))
            .await
            .unwrap();
        assert_eq!(dup, InsertOutcome::DuplicateIdentity { existing: first.id });

        // One-shot redemption, then terminal state.
        let key = RedeemKey::Usn("U1".to_string());
        assert!(matches!(
            store.redeem(&key, 5, "gate").await.unwrap(),
            RedeemOutcome::Redeemed(_)
        ));
        assert!(matches!(
            store.redeem(&key, 6, "gate").await.unwrap(),
            RedeemOutcome::AlreadyRedeemed(_)
        ));
        assert_eq!(store.list_redemptions(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn blank_usn_key_matches_nothing() {
        let store = MemoryStore::new();
        store
            .insert_entry(&new_entry("A", "a@x.in", ""))
            .await
            .unwrap();
        store
            .insert_entry(&new_entry("B", "b@x.in", ""))
            .await
            .unwrap();

        let outcome = store
            .redeem(&RedeemKey::Usn(String::new()), 5, "gate")
            .await
            .unwrap();
        assert_eq!(outcome, RedeemOutcome::NotFound);

        for entry in store.list_entries().await.unwrap() {
            assert_eq!(entry.state, TokenState::Issued);
        }
        assert!(store.list_redemptions(None).await.unwrap().is_empty());
        assert!(store.get_by_usn(" ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_groups_and_delete() {
        let store = MemoryStore::new();
        let a = match store.insert_entry(&new_entry("A", "a@x.in", "U1")).await.unwrap() {
            InsertOutcome::Inserted(e) => e,
            _ => unreachable!(),
        };
        // Manually craft a same-(name,email) sibling, as a historical
        // pre-constraint database would contain.
        {
            let mut inner = store.inner.write().unwrap();
            let id = EntryId(inner.next_id);
            inner.next_id += 1;
            let mut clone = a.clone();
            clone.id = id;
            clone.token = Token::generate();
            clone.usn = "U2".to_string();
            inner.entries.insert(id, clone);
        }

        let groups = store.duplicate_groups().await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].ids.len(), 2);
        assert_eq!(groups[0].ids[0], a.id);

        let removed = store.delete_entries(&groups[0].ids[1..]).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.list_entries().await.unwrap().len(), 1);
    }
}
