//! Resolver dispatcher: classifies a page URL and routes it to one platform resolver.
//!
//! The [`ResolverDispatcher`] keeps resolvers in registration order and picks
//! the first one whose `can_handle` accepts the raw URL. Unlike a fallback
//! chain, exactly one resolver runs per URL.

use tracing::{debug, info, warn};

use crate::config::UnknownPlatformPolicy;

use super::{Platform, ResolveContext, ResolveError, ResolvedMedia, Resolver};

/// An ordered collection of platform resolvers.
pub struct ResolverDispatcher {
    resolvers: Vec<Box<dyn Resolver>>,
    unknown_platform: UnknownPlatformPolicy,
}

impl ResolverDispatcher {
    /// Creates an empty dispatcher.
    #[must_use]
    pub fn new(unknown_platform: UnknownPlatformPolicy) -> Self {
        Self {
            resolvers: Vec::new(),
            unknown_platform,
        }
    }

    /// Appends a resolver; earlier registrations win classification ties.
    #[tracing::instrument(skip(self, resolver), fields(resolver_name))]
    pub fn register(&mut self, resolver: Box<dyn Resolver>) {
        tracing::Span::current().record("resolver_name", resolver.name());
        debug!(
            name = resolver.name(),
            platform = %resolver.platform(),
            "Registering resolver"
        );
        self.resolvers.push(resolver);
    }

    /// Returns the number of registered resolvers.
    #[must_use]
    pub fn resolver_count(&self) -> usize {
        self.resolvers.len()
    }

    /// Returns true if no resolvers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Resolver names in classification order.
    #[must_use]
    pub fn resolver_names(&self) -> Vec<&str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }

    /// The policy applied to URLs no resolver recognizes.
    #[must_use]
    pub fn unknown_platform_policy(&self) -> UnknownPlatformPolicy {
        self.unknown_platform
    }

    /// Picks the resolver for `url`.
    ///
    /// First `can_handle` match wins. With no match, the YouTube resolver is
    /// returned under [`UnknownPlatformPolicy::FallbackToYouTube`] and `None`
    /// under [`UnknownPlatformPolicy::Reject`].
    #[must_use]
    pub fn select(&self, url: &str) -> Option<&dyn Resolver> {
        if let Some(resolver) = self.resolvers.iter().find(|r| r.can_handle(url)) {
            return Some(&**resolver);
        }

        match self.unknown_platform {
            UnknownPlatformPolicy::FallbackToYouTube => {
                let fallback = self
                    .resolvers
                    .iter()
                    .find(|r| r.platform() == Platform::YouTube)
                    .map(|resolver| &**resolver);
                if fallback.is_some() {
                    warn!(url, "Unrecognized platform; falling back to YouTube resolver");
                }
                fallback
            }
            UnknownPlatformPolicy::Reject => None,
        }
    }

    /// Returns the platform `url` would be dispatched to.
    #[must_use]
    pub fn classify(&self, url: &str) -> Option<Platform> {
        self.select(url).map(|resolver| resolver.platform())
    }

    /// Resolves `url` with the selected resolver, keeping the failure kind.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::UnsupportedPlatform`] when no resolver is
    /// selected, or whatever the selected resolver reports.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn try_resolve(
        &self,
        url: &str,
        ctx: &ResolveContext,
    ) -> Result<ResolvedMedia, ResolveError> {
        let Some(resolver) = self.select(url) else {
            return Err(ResolveError::unsupported_platform(url));
        };

        debug!(resolver = resolver.name(), "Dispatching URL");
        match resolver.resolve(url, ctx).await {
            Ok(media) => {
                info!(
                    resolver = resolver.name(),
                    direct_url = %media.direct_url,
                    "Resolution successful"
                );
                Ok(media)
            }
            Err(err) => {
                if err.is_not_found() {
                    info!(resolver = resolver.name(), error = %err, "No media link found");
                } else {
                    warn!(resolver = resolver.name(), error = %err, "Resolution failed");
                }
                Err(err)
            }
        }
    }

    /// Resolves `url` to a direct media URL, collapsing every failure to `None`.
    ///
    /// Failure detail is logged by [`try_resolve`](Self::try_resolve).
    pub async fn resolve(&self, url: &str) -> Option<String> {
        self.try_resolve(url, &ResolveContext::default())
            .await
            .ok()
            .map(|media| media.direct_url)
    }
}

impl std::fmt::Debug for ResolverDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverDispatcher")
            .field("resolver_count", &self.resolvers.len())
            .field("resolvers", &self.resolver_names())
            .field("unknown_platform", &self.unknown_platform)
            .finish()
    }
}

impl Default for ResolverDispatcher {
    fn default() -> Self {
        Self::new(UnknownPlatformPolicy::default())
    }
}
