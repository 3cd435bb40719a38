use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode};
use ratatui::Terminal;
use tokio::sync::Mutex;

use crate::controllers::post_controller;
use crate::error::AgoratuiError;
use crate::models::cache::{self, FeedCache, QueryKey};
use crate::models::client::ApiClient;
use crate::models::comments::{thread_rows, CommentThread};
use crate::models::config::Config;
use crate::models::mutation::{self, SharedCache, ToggleKind};
use crate::models::post::Post;
use crate::views::widgets::{MediaCarousel, StatefulList};
use crate::views::tui;

// Redraw cadence while idle; spawned mutations surface their notices on the
// next tick rather than waiting for a keypress
const TICK: Duration = Duration::from_millis(200);

type Notice = Arc<Mutex<Option<String>>>;

/// One-shot refresh: pull the feed since the last login, fold it into the
/// disk cache, stamp the login time and persist the config (token included,
/// so a discarded token stays discarded).
pub async fn init_feed(
    client: &ApiClient,
    config: &mut Config,
    config_path: &Path,
) -> Result<(), AgoratuiError> {
    let last_login = config.get_last_login();
    let new_posts = client.fetch_feed(Some(last_login)).await?;
    cache::save_posts_to_cache(new_posts)?;

    config.update_last_login();
    config.set_token(client.token().await);
    config.save(config_path)?;
    Ok(())
}

pub async fn start_app(
    client: ApiClient,
    mut config: Config,
    config_path: PathBuf,
) -> Result<(), AgoratuiError> {
    // Seed the in-memory cache: feed and saved posts fetched together, the
    // disk cache standing in for the feed when the server is unreachable.
    let mut feed_cache = FeedCache::new();
    let (feed, saved) =
        futures::future::join(client.fetch_feed(None), client.fetch_saved()).await;

    match feed {
        Ok(posts) => {
            if let Err(e) = cache::save_posts_to_cache(posts.clone()) {
                log::warn!("disk cache write failed: {}", e);
            }
            config.update_last_login();
            config.set_token(client.token().await);
            if let Err(e) = config.save(&config_path) {
                log::warn!("config save failed: {}", e);
            }
            feed_cache.set_collection(QueryKey::feed(), posts);
        }
        Err(e) => {
            log::warn!("feed fetch failed, using disk cache: {}", e);
            let mut posts = cache::load_cached_posts()?;
            posts.sort_by_key(|post| std::cmp::Reverse(post.created_at));
            feed_cache.set_collection(QueryKey::feed(), posts);
        }
    }
    match saved {
        Ok(posts) => feed_cache.set_collection(QueryKey::saved(), posts),
        Err(e) => {
            log::warn!("saved posts fetch failed: {}", e);
            feed_cache.set_collection(QueryKey::saved(), Vec::new());
        }
    }

    // Setup terminal
    let mut terminal = tui::setup_terminal()?;

    let shared: SharedCache = Arc::new(Mutex::new(feed_cache));
    let arc_client = Arc::new(client);

    // Run the app
    let res = run_app(&mut terminal, shared, Arc::clone(&arc_client), config, config_path).await;

    // Restore terminal
    tui::restore_terminal(&mut terminal)?;

    if let Err(err) = res {
        eprintln!("{:?}", err);
    }

    Ok(())
}

pub async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    cache: SharedCache,
    client: Arc<ApiClient>,
    mut config: Config,
    config_path: PathBuf,
) -> Result<(), AgoratuiError> {
    let mut active_key = QueryKey::feed();
    let mut list: StatefulList<Post> = StatefulList::with_items(Vec::new());
    let notice: Notice = Arc::new(Mutex::new(None));
    let mut carousel: Option<MediaCarousel> = None;
    let mut carousel_for: Option<String> = None;

    loop {
        // The cache is the source of truth; the list only carries selection
        {
            let guard = cache.lock().await;
            let items = guard
                .collection(&active_key)
                .map(<[Post]>::to_vec)
                .unwrap_or_default();
            list.replace_items(items);
        }

        // Keep the carousel glued to the selected post
        match list.selected() {
            Some(post) if carousel_for.as_deref() == Some(post.id.as_str()) => {}
            Some(post) => {
                carousel = post.media.as_ref().map(MediaCarousel::new);
                carousel_for = Some(post.id.clone());
            }
            None => {
                carousel = None;
                carousel_for = None;
            }
        }

        let status = match notice.lock().await.clone() {
            Some(message) => message,
            None => title_for(&active_key),
        };
        terminal.draw(|f| tui::render_ui(f, &mut list, status, carousel.as_ref()))?;

        if !event::poll(TICK)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            // Any key clears the transient notice
            notice.lock().await.take();

            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => list.next(),
                KeyCode::Up | KeyCode::Char('k') => list.previous(),
                KeyCode::Char('g') => list.first(),
                KeyCode::Char('G') => list.last(),
                KeyCode::Left => {
                    if let Some(carousel) = carousel.as_mut() {
                        carousel.previous();
                    }
                }
                KeyCode::Right => {
                    if let Some(carousel) = carousel.as_mut() {
                        carousel.next();
                    }
                }
                KeyCode::Char('b') => {
                    active_key = if active_key == QueryKey::feed() {
                        QueryKey::saved()
                    } else {
                        QueryKey::feed()
                    };
                }
                KeyCode::Char('l') => {
                    spawn_toggle(&cache, &client, &notice, &active_key, &list, ToggleKind::Like)
                }
                KeyCode::Char('t') => {
                    spawn_toggle(&cache, &client, &notice, &active_key, &list, ToggleKind::Repost)
                }
                KeyCode::Char('s') => {
                    spawn_toggle(&cache, &client, &notice, &active_key, &list, ToggleKind::Save)
                }
                KeyCode::Char('n') => {
                    let draft = post_controller::edit_in_terminal(None);
                    terminal.clear()?;
                    match draft {
                        Ok(content) => {
                            let client = Arc::clone(&client);
                            let notice = Arc::clone(&notice);
                            tokio::spawn(async move {
                                match client.create_post(&content, None).await {
                                    Ok(_) => {
                                        *notice.lock().await =
                                            Some("published, r to refresh".to_string());
                                    }
                                    Err(e) => {
                                        log::warn!("publish failed: {}", e);
                                        *notice.lock().await =
                                            Some(format!("publish failed: {}", e));
                                    }
                                }
                            });
                        }
                        Err(e) => *notice.lock().await = Some(e.to_string()),
                    }
                }
                KeyCode::Char('e') => {
                    let target = list
                        .selected()
                        .map(|post| (post.id.clone(), post.content.clone()));
                    if let Some((id, content)) = target {
                        let draft = post_controller::edit_in_terminal(Some(&content));
                        terminal.clear()?;
                        match draft {
                            Ok(rewritten) => {
                                let cache = Arc::clone(&cache);
                                let client = Arc::clone(&client);
                                let notice = Arc::clone(&notice);
                                let key = active_key.clone();
                                tokio::spawn(async move {
                                    if let Err(e) =
                                        mutation::edit(&cache, client.as_ref(), &key, &id, &rewritten)
                                            .await
                                    {
                                        log::warn!("edit failed: {}", e);
                                        *notice.lock().await = Some(format!("edit failed: {}", e));
                                    }
                                });
                            }
                            Err(e) => *notice.lock().await = Some(e.to_string()),
                        }
                    }
                }
                KeyCode::Char('d') => {
                    if let Some(post) = list.selected() {
                        let id = post.id.clone();
                        let cache = Arc::clone(&cache);
                        let client = Arc::clone(&client);
                        let notice = Arc::clone(&notice);
                        let key = active_key.clone();
                        tokio::spawn(async move {
                            match mutation::delete(&cache, client.as_ref(), &key, &id).await {
                                Ok(()) => *notice.lock().await = Some("post deleted".to_string()),
                                Err(e) => {
                                    log::warn!("delete failed: {}", e);
                                    *notice.lock().await = Some(format!("delete failed: {}", e));
                                }
                            }
                        });
                    }
                }
                KeyCode::Char('c') => {
                    if let Some(post) = list.selected() {
                        let id = post.id.clone();
                        let draft = post_controller::edit_in_terminal(None);
                        terminal.clear()?;
                        match draft {
                            Ok(content) => {
                                let cache = Arc::clone(&cache);
                                let client = Arc::clone(&client);
                                let notice = Arc::clone(&notice);
                                let key = active_key.clone();
                                tokio::spawn(async move {
                                    match mutation::comment(
                                        &cache,
                                        client.as_ref(),
                                        &key,
                                        &id,
                                        &content,
                                        None,
                                    )
                                    .await
                                    {
                                        Ok(_) => {
                                            *notice.lock().await =
                                                Some("comment posted".to_string())
                                        }
                                        Err(e) => {
                                            log::warn!("comment failed: {}", e);
                                            *notice.lock().await =
                                                Some(format!("comment failed: {}", e));
                                        }
                                    }
                                });
                            }
                            Err(e) => *notice.lock().await = Some(e.to_string()),
                        }
                    }
                }
                KeyCode::Char('r') => {
                    terminal.draw(|f| {
                        tui::render_ui(
                            f,
                            &mut list,
                            String::from("Refreshing..."),
                            carousel.as_ref(),
                        )
                    })?;

                    let last_login = config.get_last_login();
                    match client.fetch_feed(Some(last_login)).await {
                        Ok(new_posts) => {
                            if let Err(e) = cache::save_posts_to_cache(new_posts.clone()) {
                                log::warn!("disk cache write failed: {}", e);
                            }
                            cache.lock().await.merge_new(&QueryKey::feed(), new_posts);
                            config.update_last_login();
                            config.set_token(client.token().await);
                            if let Err(e) = config.save(&config_path) {
                                log::warn!("config save failed: {}", e);
                            }
                        }
                        Err(e) => {
                            *notice.lock().await = Some(format!("refresh failed: {}", e));
                        }
                    }
                }
                KeyCode::Enter => {
                    if let Some(post) = list.selected() {
                        let post_id = post.id.clone();
                        let title = format!("Comments · {}", post.author.label());
                        run_thread_view(terminal, &cache, &client, &active_key, &post_id, title)
                            .await?;
                        terminal.clear()?;
                    }
                }
                _ => {}
            }
        }
    }
}

fn title_for(key: &QueryKey) -> String {
    if *key == QueryKey::saved() {
        String::from("Saved")
    } else {
        String::from("Feed")
    }
}

fn spawn_toggle(
    cache: &SharedCache,
    client: &Arc<ApiClient>,
    notice: &Notice,
    key: &QueryKey,
    list: &StatefulList<Post>,
    kind: ToggleKind,
) {
    let post = match list.selected() {
        Some(post) => post,
        None => return,
    };
    let id = post.id.clone();
    let cache = Arc::clone(cache);
    let client = Arc::clone(client);
    let notice = Arc::clone(notice);
    let key = key.clone();

    // Fire and forget: the optimistic apply already happened by the time
    // the response lands, and a failure rolls back and posts a notice
    tokio::spawn(async move {
        if let Err(e) = mutation::toggle(&cache, client.as_ref(), &key, &id, kind).await {
            log::warn!("{} failed: {}", kind.verb(), e);
            *notice.lock().await = Some(format!("{} failed: {}", kind.verb(), e));
        }
    });
}

/// Two-level comment view for one post. Reply visibility is toggled locally
/// with Tab; posting a reply re-fetches the thread so reply counts come
/// back from the server.
async fn run_thread_view<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    cache: &SharedCache,
    client: &Arc<ApiClient>,
    query: &QueryKey,
    post_id: &str,
    title: String,
) -> Result<(), AgoratuiError> {
    let mut thread = match client.fetch_comments(post_id).await {
        Ok(comments) => CommentThread::from_flat(comments),
        Err(e) => {
            log::warn!("comment fetch failed: {}", e);
            CommentThread::default()
        }
    };
    let mut rows = StatefulList::with_items(thread_rows(&thread));
    let mut status = title.clone();

    loop {
        terminal.draw(|f| tui::render_thread(f, &mut rows, status.clone()))?;

        if !event::poll(TICK)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => rows.next(),
                KeyCode::Up | KeyCode::Char('k') => rows.previous(),
                KeyCode::Tab => {
                    let target = rows.selected().and_then(|row| {
                        if row.is_reply {
                            None
                        } else {
                            Some(row.comment.id.clone())
                        }
                    });
                    if let Some(id) = target {
                        thread.toggle_replies(&id);
                        rows.replace_items(thread_rows(&thread));
                    }
                }
                KeyCode::Char('c') => {
                    // Reply to the selected comment; a reply row points back
                    // at its parent so the tree stays two levels deep
                    let parent = rows.selected().map(|row| match &row.comment.parent_id {
                        Some(parent) => parent.clone(),
                        None => row.comment.id.clone(),
                    });
                    let draft = post_controller::edit_in_terminal(None);
                    terminal.clear()?;
                    status = title.clone();
                    match draft {
                        Ok(content) => {
                            let result = mutation::comment(
                                cache,
                                client.as_ref(),
                                query,
                                post_id,
                                &content,
                                parent.as_deref(),
                            )
                            .await;
                            match result {
                                Ok(_) => match client.fetch_comments(post_id).await {
                                    Ok(comments) => {
                                        let expanded: Vec<String> = thread
                                            .top_level()
                                            .iter()
                                            .filter(|c| thread.is_expanded(&c.id))
                                            .map(|c| c.id.clone())
                                            .collect();
                                        thread = CommentThread::from_flat(comments);
                                        for id in expanded {
                                            thread.expand(&id);
                                        }
                                        rows.replace_items(thread_rows(&thread));
                                    }
                                    Err(e) => status = format!("comment refresh failed: {}", e),
                                },
                                Err(e) => status = format!("comment failed: {}", e),
                            }
                        }
                        Err(e) => status = e.to_string(),
                    }
                }
                _ => {}
            }
        }
    }
}
