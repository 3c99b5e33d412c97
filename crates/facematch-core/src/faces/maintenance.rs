use tracing::info;

use crate::errors::AppResult;
use crate::faces::descriptor::Descriptor;
use crate::faces::enrollment::validate_identity;
use crate::faces::store::DescriptorStore;

#[derive(Debug)]
pub struct SampleListingOutcome {
    pub identity: String,
    pub samples: Vec<Descriptor>,
    pub logs: Vec<String>,
}

impl SampleListingOutcome {
    pub fn count(&self) -> usize {
        self.samples.len()
    }
}

/// Returns an identity's enrollment set in insertion order.
///
/// Any undecodable record fails the whole listing with
/// [`AppError::CorruptRecord`](crate::errors::AppError::CorruptRecord) so
/// returned positions always line up with removal indices.
pub fn run_sample_listing_with<S>(identity: &str, store: &S) -> AppResult<SampleListingOutcome>
where
    S: DescriptorStore + ?Sized,
{
    validate_identity(identity)?;

    let samples = store
        .get_samples(identity)?
        .iter()
        .enumerate()
        .map(|(index, sample)| sample.decode(identity, index))
        .collect::<AppResult<Vec<_>>>()?;

    let logs = vec![format!(
        "Loaded {} descriptor(s) for identity {identity}",
        samples.len()
    )];
    Ok(SampleListingOutcome {
        identity: identity.to_string(),
        samples,
        logs,
    })
}

#[derive(Debug)]
pub struct SampleRemovalOutcome {
    pub identity: String,
    pub removed_index: usize,
    pub remaining: usize,
    pub logs: Vec<String>,
}

/// Removes the descriptor at `index`; later descriptors shift down by one.
pub fn run_sample_removal_with<S>(
    identity: &str,
    index: usize,
    store: &S,
) -> AppResult<SampleRemovalOutcome>
where
    S: DescriptorStore + ?Sized,
{
    validate_identity(identity)?;
    store.remove_sample_at(identity, index)?;
    let remaining = store.get_samples(identity)?.len();

    info!(identity, index, remaining, "removed descriptor");
    let mut logs = vec![format!("Removed descriptor #{index} from identity {identity}")];
    if remaining == 0 {
        logs.push(format!("Identity {identity} is no longer enrolled"));
    } else {
        logs.push(format!("{remaining} descriptor(s) remain"));
    }

    Ok(SampleRemovalOutcome {
        identity: identity.to_string(),
        removed_index: index,
        remaining,
        logs,
    })
}

#[derive(Debug)]
pub struct SampleClearOutcome {
    pub identity: String,
    pub logs: Vec<String>,
}

pub fn run_sample_clear_with<S>(identity: &str, store: &S) -> AppResult<SampleClearOutcome>
where
    S: DescriptorStore + ?Sized,
{
    validate_identity(identity)?;
    store.clear_samples(identity)?;

    info!(identity, "cleared enrollment set");
    Ok(SampleClearOutcome {
        identity: identity.to_string(),
        logs: vec![format!("Cleared all descriptors for identity {identity}")],
    })
}
