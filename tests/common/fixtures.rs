//! Test fixtures
//!
//! Shows and transcript topics of the fake forum, and the HTML it serves.

use super::constants::*;
use std::collections::HashMap;

/// A transcript topic: `body` is the markup of the post content.
#[derive(Debug, Clone)]
pub struct ForumTopic {
    pub id: &'static str,
    pub title: &'static str,
    pub body: &'static str,
}

/// A forum of the fake site, one per show.
#[derive(Debug, Clone)]
pub struct ForumShow {
    pub id: &'static str,
    pub title: &'static str,
    /// Topic ids linked from each listing page, in page order.
    pub pages: Vec<Vec<&'static str>>,
}

/// Everything the fake forum knows about.
#[derive(Debug, Clone, Default)]
pub struct ForumContent {
    pub shows: HashMap<String, ForumShow>,
    pub topics: HashMap<String, ForumTopic>,
}

impl ForumContent {
    fn add_show(&mut self, show: ForumShow) {
        self.shows.insert(show.id.to_string(), show);
    }

    fn add_topic(&mut self, topic: ForumTopic) {
        self.topics.insert(topic.id.to_string(), topic);
    }
}

/// Two shows: one complete over two listing pages and one whose first
/// topic is gone. The announcement is linked everywhere, like on the real
/// forum, and its page is not a transcript.
pub fn create_forum_content() -> ForumContent {
    let mut content = ForumContent::default();

    content.add_show(ForumShow {
        id: SHOW_ID,
        title: SHOW_TITLE,
        pages: vec![
            vec![ANNOUNCEMENT_TOPIC_ID, TOPIC_1X01, TOPIC_1X02],
            vec![ANNOUNCEMENT_TOPIC_ID, TOPIC_2X01, TOPIC_GAG_REEL],
        ],
    });
    content.add_show(ForumShow {
        id: BROKEN_SHOW_ID,
        title: BROKEN_SHOW_TITLE,
        pages: vec![vec![ANNOUNCEMENT_TOPIC_ID, MISSING_TOPIC_ID, AVAILABLE_TOPIC_ID]],
    });

    content.add_topic(ForumTopic {
        id: ANNOUNCEMENT_TOPIC_ID,
        title: "Forum rules",
        body: "Please be nice.",
    });
    content.add_topic(ForumTopic {
        id: TOPIC_1X01,
        title: TITLE_1X01,
        body: "Ross: I love coffee.<br />Monica: I need coffee.",
    });
    content.add_topic(ForumTopic {
        id: TOPIC_1X02,
        title: TITLE_1X02,
        body: "Ross: The baby is fine.<br />Rachel: I want coffee and more coffee.",
    });
    content.add_topic(ForumTopic {
        id: TOPIC_2X01,
        title: TITLE_2X01,
        body: "Rachel: This is sh*t coffee.",
    });
    content.add_topic(ForumTopic {
        id: TOPIC_GAG_REEL,
        title: TITLE_GAG_REEL,
        body: "Joey: How you doin&#39;?",
    });
    content.add_topic(ForumTopic {
        id: AVAILABLE_TOPIC_ID,
        title: "01x01 - The Seinfeld Chronicles",
        body: "Jerry: What is the deal with coffee?",
    });

    content
}

/// Listing page `page` (0-based) of a forum, with the pagination bar.
pub fn forum_page_html(show: &ForumShow, page: usize) -> String {
    let pagination: String = (1..=show.pages.len())
        .map(|n| {
            format!(
                r#"<li><a href="./viewforum.php?f={}&amp;start={}">{}</a></li>"#,
                show.id,
                (n - 1) * FORUM_PAGE_SIZE,
                n
            )
        })
        .collect();
    let topics: String = show
        .pages
        .get(page)
        .map(|ids| {
            ids.iter()
                .map(|id| {
                    format!(
                        r#"<li class="row"><a href="./viewtopic.php?f={}&amp;t={}" class="topictitle">Topic {}</a></li>"#,
                        show.id, id, id
                    )
                })
                .collect()
        })
        .unwrap_or_default();

    format!(
        r#"<html><body>
<h2 class="forum-title"><a href="./viewforum.php?f={id}">{title}</a></h2>
<div class="action-bar"><div class="pagination"><ul>{pagination}</ul></div></div>
<ul class="topiclist topics">{topics}</ul>
</body></html>"#,
        id = show.id,
        title = show.title,
        pagination = pagination,
        topics = topics,
    )
}

pub fn topic_page_html(topic: &ForumTopic) -> String {
    format!(
        r#"<html><body>
<h2 class="topic-title"><a href="./viewtopic.php?t={id}">{title}</a></h2>
<div class="post has-profile"><div class="postbody"><div class="content">{body}</div></div></div>
</body></html>"#,
        id = topic.id,
        title = topic.title,
        body = topic.body,
    )
}
