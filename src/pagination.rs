/// Page-number pagination for signed list endpoints.
///
/// A [`PageInfo`] is a cursor owned by the caller. Each call to
/// [`BitkubApi::fetch_secure_list`] requests the cursor's page and then
/// advances it from the server's pagination block: the page after the one
/// just returned, or `done` once the server reports the last page. Any error
/// also ends the walk.
use std::marker::PhantomData;

use log::debug;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::api::{BitkubApi, CallOptions, QueryParams, Response};
use crate::decode::coerce_i64;
use crate::errors::BitkubError;
use crate::signing::EnvelopeBuilder;

const PAGE_PARAM: &str = "p";
const LIMIT_PARAM: &str = "lmt";

fn is_zero(n: &i64) -> bool {
    *n == 0
}

/// Pagination cursor.
///
/// `page` and `limit` are request parameters, sent only when positive. The
/// remaining counters mirror the server's pagination block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    /// Send `p` and `lmt` inside the signed body instead of the query string.
    #[serde(skip)]
    pub in_body: bool,
    pub page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub limit: i64,
    pub last: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub next: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub prev: i64,
    #[serde(skip)]
    pub done: bool,
}

impl<'de> Deserialize<'de> for PageInfo {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Map::<String, Value>::deserialize(deserializer)?;
        let field = |name: &str| coerce_i64(raw.get(name), name).map_err(D::Error::custom);
        Ok(PageInfo {
            in_body: false,
            page: field("page")?,
            limit: field("limit")?,
            last: field("last")?,
            next: field("next")?,
            prev: field("prev")?,
            done: false,
        })
    }
}

impl PageInfo {
    /// A cursor starting from the server's default page.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: i64) -> Self {
        self.page = page;
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_in_body(mut self, in_body: bool) -> Self {
        self.in_body = in_body;
        self
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// The `p`/`lmt` pairs this cursor contributes to a request.
    fn request_params(&self) -> Vec<(&'static str, i64)> {
        [(PAGE_PARAM, self.page), (LIMIT_PARAM, self.limit)]
            .into_iter()
            .filter(|(_, value)| *value > 0)
            .collect()
    }

    /// Move to the page after the one the server just returned.
    pub(crate) fn advance(&mut self, server: &PageInfo) {
        self.page = server.page;
        self.last = server.last;
        if self.page == self.last {
            self.done = true;
        } else {
            self.page += 1;
        }
    }
}

impl BitkubApi {
    /// Fetch one page of a signed list endpoint and advance `page`.
    ///
    /// Returns the page's `result`. On any error `page` is marked done and
    /// left otherwise untouched.
    pub async fn fetch_secure_list<P, T>(
        &self,
        endpoint: &str,
        page: &mut PageInfo,
        payload: Option<&P>,
        opts: &CallOptions,
    ) -> Result<T, BitkubError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        match self.fetch_page(endpoint, page, payload, opts).await {
            Ok(response) => {
                page.advance(&response.pagination.unwrap_or_default());
                debug!(
                    "pagination.advance endpoint={} page={} last={} done={}",
                    endpoint, page.page, page.last, page.done
                );
                Ok(response.result)
            }
            Err(err) => {
                page.done = true;
                Err(err)
            }
        }
    }

    async fn fetch_page<P, T>(
        &self,
        endpoint: &str,
        page: &PageInfo,
        payload: Option<&P>,
        opts: &CallOptions,
    ) -> Result<Response<T>, BitkubError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let credentials = self.resolve_credentials(opts)?;
        let mut envelope = EnvelopeBuilder::new(payload)?;
        let mut query = QueryParams::new();
        for (name, value) in page.request_params() {
            if page.in_body {
                envelope = envelope.field(name, &value)?;
            } else {
                query.insert(name, value);
            }
        }
        debug!(
            "pagination.fetch endpoint={} page={} limit={} in_body={}",
            endpoint, page.page, page.limit, page.in_body
        );
        self.send_signed(endpoint, Some(&query), envelope, credentials, opts)
            .await
    }

    /// Walk a signed list endpoint page by page.
    pub fn pages<'a, P, T>(
        &'a self,
        endpoint: &str,
        cursor: PageInfo,
        payload: Option<&'a P>,
        opts: CallOptions,
    ) -> Pages<'a, P, T>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        Pages {
            api: self,
            endpoint: endpoint.to_string(),
            payload,
            opts,
            cursor,
            _result: PhantomData,
        }
    }
}

/// A pull-based page walker returned by [`BitkubApi::pages`].
///
/// ```no_run
/// # async fn run(api: &bitkub_sdk::BitkubApi) -> Result<(), bitkub_sdk::BitkubError> {
/// use bitkub_sdk::{CallOptions, FiatDeposit, PageInfo, NO_PAYLOAD};
///
/// let mut pages = api.pages::<(), Vec<FiatDeposit>>(
///     "/api/fiat/deposit-history",
///     PageInfo::new().with_limit(50),
///     NO_PAYLOAD,
///     CallOptions::new(),
/// );
/// while let Some(deposits) = pages.next_page().await? {
///     println!("{} deposits", deposits.len());
/// }
/// # Ok(())
/// # }
/// ```
pub struct Pages<'a, P: ?Sized, T> {
    api: &'a BitkubApi,
    endpoint: String,
    payload: Option<&'a P>,
    opts: CallOptions,
    cursor: PageInfo,
    _result: PhantomData<fn() -> T>,
}

impl<'a, P, T> Pages<'a, P, T>
where
    P: Serialize + ?Sized,
    T: DeserializeOwned,
{
    /// Fetch the next page, or `None` once the cursor is done.
    pub async fn next_page(&mut self) -> Result<Option<T>, BitkubError> {
        if self.cursor.done {
            return Ok(None);
        }
        self.api
            .fetch_secure_list(&self.endpoint, &mut self.cursor, self.payload, &self.opts)
            .await
            .map(Some)
    }

    pub fn cursor(&self) -> &PageInfo {
        &self.cursor
    }
}
