//! Built-in content: fallback sentence pools per difficulty and the starter word list.
//!
//! Pinyin is written with tone numbers and goes through the tone converter
//! when a sentence is served.

use rand::Rng;
use uuid::Uuid;

use crate::domain::{Difficulty, NewWord, Sentence};
use crate::pinyin::convert_numeric_pinyin_to_tonal;

/// (chinese, numeric pinyin, english)
type FallbackEntry = (&'static str, &'static str, &'static str);

const POOL_SIZE: usize = 5;

static BEGINNER: [FallbackEntry; POOL_SIZE] = [
  ("我喜欢喝茶。", "wo3 xi3 huan5 he1 cha2", "I like drinking tea."),
  ("今天天气很好。", "jin1 tian1 tian1 qi4 hen3 hao3", "The weather is very nice today."),
  ("你叫什么名字？", "ni3 jiao4 shen2 me5 ming2 zi5", "What is your name?"),
  ("我们去学校吧。", "wo3 men5 qu4 xue2 xiao4 ba5", "Let's go to school."),
  ("他是我的朋友。", "ta1 shi4 wo3 de5 peng2 you5", "He is my friend."),
];

static INTERMEDIATE: [FallbackEntry; POOL_SIZE] = [
  (
    "我昨天在图书馆看了两个小时的书。",
    "wo3 zuo2 tian1 zai4 tu2 shu1 guan3 kan4 le5 liang3 ge4 xiao3 shi2 de5 shu1",
    "Yesterday I read for two hours at the library.",
  ),
  (
    "如果明天下雨，我们就不去公园了。",
    "ru2 guo3 ming2 tian1 xia4 yu3 wo3 men5 jiu4 bu4 qu4 gong1 yuan2 le5",
    "If it rains tomorrow, we won't go to the park.",
  ),
  (
    "这家饭馆的菜又便宜又好吃。",
    "zhe4 jia1 fan4 guan3 de5 cai4 you4 pian2 yi5 you4 hao3 chi1",
    "The food at this restaurant is both cheap and tasty.",
  ),
  (
    "我打算下个月去北京旅游。",
    "wo3 da3 suan4 xia4 ge4 yue4 qu4 bei3 jing1 lv3 you2",
    "I plan to travel to Beijing next month.",
  ),
  (
    "她一边听音乐一边做作业。",
    "ta1 yi1 bian1 ting1 yin1 yue4 yi1 bian1 zuo4 zuo4 ye4",
    "She does her homework while listening to music.",
  ),
];

static ADVANCED: [FallbackEntry; POOL_SIZE] = [
  (
    "虽然这个问题很复杂，但是我们应该能找到解决的办法。",
    "sui1 ran2 zhe4 ge4 wen4 ti2 hen3 fu4 za2 dan4 shi4 wo3 men5 ying1 gai1 neng2 zhao3 dao4 jie3 jue2 de5 ban4 fa3",
    "Although this problem is complicated, we should be able to find a solution.",
  ),
  (
    "随着科技的发展，人们的生活方式发生了很大的变化。",
    "sui2 zhe5 ke1 ji4 de5 fa1 zhan3 ren2 men5 de5 sheng1 huo2 fang1 shi4 fa1 sheng1 le5 hen3 da4 de5 bian4 hua4",
    "With the development of technology, people's way of life has changed greatly.",
  ),
  (
    "他之所以成功，是因为他从来不放弃。",
    "ta1 zhi1 suo3 yi3 cheng2 gong1 shi4 yin1 wei4 ta1 cong2 lai2 bu4 fang4 qi4",
    "The reason he succeeded is that he never gives up.",
  ),
  (
    "为了保护环境，我们应该尽量减少使用塑料袋。",
    "wei4 le5 bao3 hu4 huan2 jing4 wo3 men5 ying1 gai1 jin3 liang4 jian3 shao3 shi3 yong4 su4 liao4 dai4",
    "To protect the environment, we should use as few plastic bags as possible.",
  ),
  (
    "即使工作再忙，她也会抽时间陪家人。",
    "ji2 shi3 gong1 zuo4 zai4 mang2 ta1 ye3 hui4 chou1 shi2 jian1 pei2 jia1 ren2",
    "Even when work is busy, she still makes time for her family.",
  ),
];

fn pool(difficulty: Difficulty) -> &'static [FallbackEntry; POOL_SIZE] {
  match difficulty {
    Difficulty::Beginner => &BEGINNER,
    Difficulty::Intermediate => &INTERMEDIATE,
    Difficulty::Advanced => &ADVANCED,
  }
}

/// Uniform-random pick from the difficulty's fallback pool, tagged `from_fallback`.
pub fn pick_fallback(difficulty: Difficulty) -> Sentence {
  let i = rand::thread_rng().gen_range(0..POOL_SIZE);
  to_sentence(difficulty, &pool(difficulty)[i])
}

/// True if `chinese` is one of the built-in sentences for `difficulty`.
#[cfg(test)]
pub fn is_fallback_for(difficulty: Difficulty, chinese: &str) -> bool {
  pool(difficulty).iter().any(|(zh, _, _)| *zh == chinese)
}

fn to_sentence(difficulty: Difficulty, (zh, py, en): &FallbackEntry) -> Sentence {
  Sentence {
    id: Uuid::new_v4().to_string(),
    difficulty,
    chinese: (*zh).into(),
    pinyin: convert_numeric_pinyin_to_tonal(py),
    english: (*en).into(),
    from_fallback: true,
    words: Vec::new(),
  }
}

/// Starter word list used by the in-memory (dev mode) vocabulary.
pub fn seed_vocabulary() -> Vec<NewWord> {
  [
    ("喜欢", "xi3 huan5", "to like"),
    ("喝", "he1", "to drink"),
    ("茶", "cha2", "tea"),
    ("天气", "tian1 qi4", "weather"),
    ("朋友", "peng2 you5", "friend"),
    ("学校", "xue2 xiao4", "school"),
    ("图书馆", "tu2 shu1 guan3", "library"),
    ("旅游", "lv3 you2", "to travel"),
  ]
  .into_iter()
  .map(|(chinese, pinyin, english)| NewWord {
    chinese: chinese.into(),
    pinyin: pinyin.into(),
    english: english.into(),
    active: true,
  })
  .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pinyin::has_tone_mark;

  #[test]
  fn fallback_comes_from_requested_tier() {
    for _ in 0..20 {
      let s = pick_fallback(Difficulty::Intermediate);
      assert!(s.from_fallback);
      assert_eq!(s.difficulty, Difficulty::Intermediate);
      assert!(is_fallback_for(Difficulty::Intermediate, &s.chinese));
      assert!(!is_fallback_for(Difficulty::Beginner, &s.chinese));
    }
  }

  #[test]
  fn fallback_reaches_every_pool_entry() {
    let seen: std::collections::HashSet<String> =
      (0..200).map(|_| pick_fallback(Difficulty::Beginner).chinese).collect();
    assert_eq!(seen.len(), POOL_SIZE);
  }

  #[test]
  fn fallback_pinyin_is_tone_marked() {
    for d in [Difficulty::Beginner, Difficulty::Intermediate, Difficulty::Advanced] {
      for entry in pool(d) {
        let s = to_sentence(d, entry);
        assert!(has_tone_mark(&s.pinyin), "{}", s.pinyin);
        assert!(!s.pinyin.chars().any(|c| c.is_ascii_digit()), "{}", s.pinyin);
      }
    }
  }
}
