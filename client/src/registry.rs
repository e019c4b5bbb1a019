use std::collections::HashMap;

use stratboard_shared::{supersedes, ClientId, ClientState, Snapshot};

use crate::strokes::StrokeBuffer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Replaced,
    Unchanged,
    Stale,
    Local,
}

struct RemoteEntry {
    state: ClientState,
    seq: Option<u64>,
    revision: u64,
}

/// A view of one registry entry. Within one `revision` a stroke list only
/// grows at its tail, so renderers may cache per-stroke geometry.
pub struct ClientEntry<'a> {
    pub id: &'a ClientId,
    pub state: &'a ClientState,
    pub revision: u64,
    pub local: bool,
}

pub struct ClientRegistry {
    local: StrokeBuffer,
    remotes: HashMap<ClientId, RemoteEntry>,
}

impl ClientRegistry {
    pub fn new(local: ClientState) -> Self {
        Self {
            local: StrokeBuffer::new(local),
            remotes: HashMap::new(),
        }
    }

    pub fn local_id(&self) -> &ClientId {
        &self.local.state().id
    }

    pub fn get_local(&mut self) -> &mut StrokeBuffer {
        &mut self.local
    }

    pub fn local(&self) -> &StrokeBuffer {
        &self.local
    }

    pub fn get(&self, id: &ClientId) -> Option<&ClientState> {
        if id == self.local_id() {
            return Some(self.local.state());
        }
        self.remotes.get(id).map(|entry| &entry.state)
    }

    pub fn upsert(&mut self, snapshot: Snapshot) -> UpsertOutcome {
        let Snapshot { state, seq } = snapshot;
        if state.id == *self.local_id() {
            return UpsertOutcome::Local;
        }
        match self.remotes.get_mut(&state.id) {
            None => {
                self.remotes.insert(
                    state.id.clone(),
                    RemoteEntry {
                        state,
                        seq,
                        revision: 0,
                    },
                );
                UpsertOutcome::Inserted
            }
            Some(entry) => {
                if !supersedes(seq, entry.seq) {
                    return UpsertOutcome::Stale;
                }
                if seq.is_some() {
                    entry.seq = seq;
                }
                if entry.state == state {
                    return UpsertOutcome::Unchanged;
                }
                entry.state = state;
                entry.revision += 1;
                UpsertOutcome::Replaced
            }
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = ClientEntry<'_>> {
        let local = std::iter::once(ClientEntry {
            id: self.local_id(),
            state: self.local.state(),
            revision: self.local.generation(),
            local: true,
        });
        local.chain(self.remotes.iter().map(|(id, entry)| ClientEntry {
            id,
            state: &entry.state,
            revision: entry.revision,
            local: false,
        }))
    }

    pub fn iter_all(&self) -> impl Iterator<Item = (&ClientId, &ClientState)> {
        self.entries().map(|entry| (entry.id, entry.state))
    }
}
