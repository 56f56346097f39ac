//! Sent when a Twitch-specific event occurs in a channel,
//! such as a subscription or a raid. Sub-typed by the `msg-id` tag.

use super::{is_not_empty, parse_message_text, parse_sender, parse_timestamp, User};
use crate::common::maybe_unescape;
use crate::irc::{Command, IrcMessageRef, Tag};
use chrono::{DateTime, Utc};
use std::borrow::Cow;

/// Login used by Twitch for anonymous gifters.
const AN_ANONYMOUS_GIFTER: &str = "ananonymousgifter";

/// A Twitch-specific channel event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserNotice<'src> {
  /// Login of the channel which received this notice.
  pub channel: &'src str,

  /// ID of the channel which received this notice.
  pub channel_id: &'src str,

  /// Origin of the notice.
  ///
  /// [`None`] if the sender is anonymous, e.g. for anonymous gift subs.
  pub sender: Option<User<'src>>,

  /// Message sent along with the notice, e.g. a resub message.
  pub text: Option<&'src str>,

  /// Message shown in chat for the notice, e.g.
  /// `FooBar subscribed at Tier 1.`
  pub system_message: Option<Cow<'src, str>>,

  /// Event-specific information.
  pub event: UserNoticeEvent<'src>,

  /// Raw value of the `msg-id` tag this notice was sub-typed by.
  pub event_id: &'src str,

  /// Unique ID of the notice.
  pub message_id: &'src str,

  /// The time at which the notice was sent.
  pub timestamp: DateTime<Utc>,
}

/// Event-specific information of a [`UserNotice`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserNoticeEvent<'src> {
  /// User subscribes or resubscribes to a channel.
  /// They are paying for their own subscription.
  Subscription {
    /// `false` for the user's first subscription in the channel.
    is_resub: bool,

    /// Cumulative number of months the user has been subscribed.
    cumulative_months: u64,

    /// Consecutive number of months the user has been subscribed,
    /// if they chose to share their streak.
    streak_months: Option<u64>,

    /// Subscription tier, e.g. `1000` for tier 1 or `Prime`.
    sub_plan: &'src str,
  },

  /// A user is gifting a subscription to a specific user.
  ///
  /// If the gift is anonymous, then [`UserNotice::sender`] is [`None`].
  SubGift {
    /// The user who received the gift.
    recipient: User<'src>,

    /// Number of months in a single multi-month gift.
    gift_months: u64,

    /// Subscription tier.
    sub_plan: &'src str,
  },

  /// A user is gifting a batch of subscriptions to random users.
  ///
  /// If the gift is anonymous, then [`UserNotice::sender`] is [`None`].
  SubMysteryGift {
    /// Number of gifts.
    count: u64,

    /// Total number of gifts the sender has given in this channel.
    /// Hidden for anonymous gifts.
    sender_total: Option<u64>,

    /// Subscription tier.
    sub_plan: &'src str,
  },

  /// A user continues the subscription they were gifted.
  ///
  /// The gifter fields are [`None`] if the original gift was anonymous.
  GiftPaidUpgrade {
    /// Login of the original gifter.
    gifter_login: Option<&'src str>,

    /// Display name of the original gifter.
    gifter_name: Option<&'src str>,
  },

  /// A user converts their Prime subscription into a paid one.
  PrimeUpgrade {
    /// Subscription tier they upgraded to.
    sub_plan: &'src str,
  },

  /// The channel has been raided.
  Raid {
    /// Number of viewers participating in the raid.
    viewer_count: u64,

    /// Profile picture of the raiding channel.
    profile_image_url: &'src str,
  },

  /// Someone sent an `/announcement`.
  Announcement {
    /// Color used to highlight the announcement,
    /// e.g. `PRIMARY` or `BLUE`.
    highlight_color: Option<&'src str>,
  },
}

fn parse_u64_tag(message: &IrcMessageRef<'_>, tag: Tag<'_>) -> Option<u64> {
  message.tag(tag).and_then(|v| v.parse().ok())
}

impl<'src> UserNotice<'src> {
  fn parse(message: IrcMessageRef<'src>) -> Option<Self> {
    if message.command() != Command::UserNotice {
      return None;
    }

    let event_id = message.tag(Tag::MsgId)?;
    let mut anonymous = false;
    let event = match event_id {
      "sub" | "resub" => UserNoticeEvent::Subscription {
        is_resub: event_id == "resub",
        cumulative_months: parse_u64_tag(&message, Tag::MsgParamCumulativeMonths).unwrap_or(1),
        streak_months: message
          .tag(Tag::MsgParamShouldShareStreak)
          .filter(|v| *v == "1")
          .and_then(|_| parse_u64_tag(&message, Tag::MsgParamStreakMonths)),
        sub_plan: message.tag(Tag::MsgParamSubPlan)?,
      },
      "subgift" | "anonsubgift" => {
        anonymous = event_id == "anonsubgift";
        UserNoticeEvent::SubGift {
          recipient: User {
            id: message.tag(Tag::MsgParamRecipientId)?,
            login: message.tag(Tag::MsgParamRecipientUserName)?,
            name: message
              .tag(Tag::MsgParamRecipientDisplayName)
              .filter(is_not_empty)
              .unwrap_or(message.tag(Tag::MsgParamRecipientUserName)?),
          },
          gift_months: parse_u64_tag(&message, Tag::MsgParamGiftMonths).unwrap_or(1),
          sub_plan: message.tag(Tag::MsgParamSubPlan)?,
        }
      }
      "submysterygift" | "anonsubmysterygift" => {
        anonymous = event_id == "anonsubmysterygift";
        UserNoticeEvent::SubMysteryGift {
          count: parse_u64_tag(&message, Tag::MsgParamMassGiftCount)?,
          sender_total: parse_u64_tag(&message, Tag::MsgParamSenderCount),
          sub_plan: message.tag(Tag::MsgParamSubPlan)?,
        }
      }
      "giftpaidupgrade" => UserNoticeEvent::GiftPaidUpgrade {
        gifter_login: message.tag(Tag::MsgParamSenderLogin),
        gifter_name: message.tag(Tag::MsgParamSenderName),
      },
      "anongiftpaidupgrade" => UserNoticeEvent::GiftPaidUpgrade {
        gifter_login: None,
        gifter_name: None,
      },
      "primepaidupgrade" => UserNoticeEvent::PrimeUpgrade {
        sub_plan: message.tag(Tag::MsgParamSubPlan)?,
      },
      "raid" => UserNoticeEvent::Raid {
        viewer_count: parse_u64_tag(&message, Tag::MsgParamViewerCount)?,
        profile_image_url: message.tag(Tag::MsgParamProfileImageUrl).unwrap_or(""),
      },
      "announcement" => UserNoticeEvent::Announcement {
        highlight_color: message.tag(Tag::MsgParamColor).filter(is_not_empty),
      },
      // unrecognized events are dropped
      _ => return None,
    };

    let sender = match anonymous {
      true => None,
      false => parse_sender_tags(&message).filter(|user| user.login != AN_ANONYMOUS_GIFTER),
    };

    Some(UserNotice {
      channel: message.channel()?,
      channel_id: message.tag(Tag::RoomId)?,
      sender,
      text: message.text().map(|text| parse_message_text(text).0),
      system_message: message
        .tag(Tag::SystemMsg)
        .filter(is_not_empty)
        .map(maybe_unescape),
      event,
      event_id,
      message_id: message.tag(Tag::Id)?,
      timestamp: parse_timestamp(message.tag(Tag::TmiSentTs)?)?,
    })
  }
}

/// `USERNOTICE` lines are prefixed by `tmi.twitch.tv`, so the sender
/// comes out of the `login` tag instead.
fn parse_sender_tags<'src>(message: &IrcMessageRef<'src>) -> Option<User<'src>> {
  match message.tag(Tag::Login) {
    Some(login) => Some(User {
      id: message.tag(Tag::UserId)?,
      login,
      name: message
        .tag(Tag::DisplayName)
        .filter(is_not_empty)
        .unwrap_or(login),
    }),
    None => parse_sender(message),
  }
}

impl<'src> super::FromIrc<'src> for UserNotice<'src> {
  #[inline]
  fn from_irc(message: IrcMessageRef<'src>) -> Option<Self> {
    Self::parse(message)
  }
}

impl<'src> From<UserNotice<'src>> for super::Message<'src> {
  fn from(msg: UserNotice<'src>) -> Self {
    super::Message::UserNotice(msg)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_resub_with_streak() {
    let msg = IrcMessageRef::parse(
      "@badge-info=subscriber/5;badges=subscriber/3;color=;display-name=Alice;id=db25007f-7a18-43eb-9379-80131e44d633;login=alice;mod=0;msg-id=resub;msg-param-cumulative-months=5;msg-param-months=0;msg-param-should-share-streak=1;msg-param-streak-months=3;msg-param-sub-plan-name=Channel\\sSub;msg-param-sub-plan=1000;room-id=1337;system-msg=Alice\\ssubscribed\\sat\\sTier\\s1.;tmi-sent-ts=1507246572675;user-id=13405587 :tmi.twitch.tv USERNOTICE #forsen :great stream",
    )
    .unwrap();
    let msg = UserNotice::parse(msg).unwrap();

    assert_eq!(msg.channel, "forsen");
    assert_eq!(msg.event_id, "resub");
    assert_eq!(
      msg.event,
      UserNoticeEvent::Subscription {
        is_resub: true,
        cumulative_months: 5,
        streak_months: Some(3),
        sub_plan: "1000",
      }
    );
    assert_eq!(msg.sender.unwrap().login, "alice");
    assert_eq!(msg.text, Some("great stream"));
    assert_eq!(
      msg.system_message.as_deref(),
      Some("Alice subscribed at Tier 1.")
    );
  }

  #[test]
  fn parse_sub_hides_unshared_streak() {
    let msg = IrcMessageRef::parse(
      "@badges=;color=;display-name=A;id=1;login=a;msg-id=sub;msg-param-cumulative-months=1;msg-param-should-share-streak=0;msg-param-sub-plan=Prime;room-id=2;tmi-sent-ts=1507246572675;user-id=3 :tmi.twitch.tv USERNOTICE #c",
    )
    .unwrap();
    let msg = UserNotice::parse(msg).unwrap();

    assert_eq!(
      msg.event,
      UserNoticeEvent::Subscription {
        is_resub: false,
        cumulative_months: 1,
        streak_months: None,
        sub_plan: "Prime",
      }
    );
    assert_eq!(msg.text, None);
  }

  #[test]
  fn parse_anonymous_gift_sub() {
    let msg = IrcMessageRef::parse(
      "@badges=;color=;display-name=AnAnonymousGifter;id=1;login=ananonymousgifter;msg-id=subgift;msg-param-gift-months=1;msg-param-recipient-display-name=Bob;msg-param-recipient-id=4;msg-param-recipient-user-name=bob;msg-param-sub-plan=1000;room-id=2;tmi-sent-ts=1507246572675;user-id=274598607 :tmi.twitch.tv USERNOTICE #c",
    )
    .unwrap();
    let msg = UserNotice::parse(msg).unwrap();

    assert_eq!(msg.sender, None);
    assert_eq!(
      msg.event,
      UserNoticeEvent::SubGift {
        recipient: User {
          id: "4",
          login: "bob",
          name: "Bob"
        },
        gift_months: 1,
        sub_plan: "1000",
      }
    );
  }

  #[test]
  fn parse_mystery_gift() {
    let msg = IrcMessageRef::parse(
      "@badges=;display-name=A;id=1;login=a;msg-id=submysterygift;msg-param-mass-gift-count=5;msg-param-sender-count=20;msg-param-sub-plan=1000;room-id=2;tmi-sent-ts=1507246572675;user-id=3 :tmi.twitch.tv USERNOTICE #c",
    )
    .unwrap();
    let msg = UserNotice::parse(msg).unwrap();

    assert_eq!(
      msg.event,
      UserNoticeEvent::SubMysteryGift {
        count: 5,
        sender_total: Some(20),
        sub_plan: "1000",
      }
    );
  }

  #[test]
  fn parse_raid() {
    let msg = IrcMessageRef::parse(
      "@badges=;display-name=A;id=1;login=a;msg-id=raid;msg-param-displayName=A;msg-param-login=a;msg-param-profileImageURL=https://example.com/a.png;msg-param-viewerCount=430;room-id=2;tmi-sent-ts=1507246572675;user-id=3 :tmi.twitch.tv USERNOTICE #c",
    )
    .unwrap();
    let msg = UserNotice::parse(msg).unwrap();

    assert_eq!(
      msg.event,
      UserNoticeEvent::Raid {
        viewer_count: 430,
        profile_image_url: "https://example.com/a.png",
      }
    );
  }

  #[test]
  fn parse_announcement() {
    let msg = IrcMessageRef::parse(
      "@badges=moderator/1;display-name=A;id=1;login=a;msg-id=announcement;msg-param-color=PRIMARY;room-id=2;tmi-sent-ts=1507246572675;user-id=3 :tmi.twitch.tv USERNOTICE #c :stream starting",
    )
    .unwrap();
    let msg = UserNotice::parse(msg).unwrap();

    assert_eq!(
      msg.event,
      UserNoticeEvent::Announcement {
        highlight_color: Some("PRIMARY")
      }
    );
    assert_eq!(msg.text, Some("stream starting"));
  }

  #[test]
  fn drop_unknown_event_id() {
    let msg = IrcMessageRef::parse(
      "@badges=;display-name=A;id=1;login=a;msg-id=rewardgift;room-id=2;tmi-sent-ts=1507246572675;user-id=3 :tmi.twitch.tv USERNOTICE #c",
    )
    .unwrap();
    assert!(UserNotice::parse(msg).is_none());
  }
}
